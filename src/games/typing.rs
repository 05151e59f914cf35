//! Typing defense
//!
//! Words fall toward the ground. Typing a word's first letter locks onto
//! the lowest word starting with it; the rest of the word must follow in
//! order. A wrong letter drops the lock and the word's progress.

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::consts::SIM_DT;
use crate::renderer::{Align, Color, Frame};
use crate::settings::Settings;
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

pub const WORDS: &[&str] = &[
    "rust", "borrow", "crate", "trait", "match", "vector", "slice", "tuple", "macro", "async",
    "await", "future", "option", "result", "iterator", "closure", "lifetime", "struct", "enum",
    "module", "pointer", "thread", "mutex", "channel", "cargo", "clippy", "unsafe", "generic",
    "impl", "yield", "queue", "heap", "stack", "kernel", "socket", "buffer", "parser", "zero",
];

pub const FONT_SIZE: f32 = 20.0;
/// Points per letter of a destroyed word
pub const LETTER_POINTS: u64 = 10;
/// Words destroyed per level
pub const WORDS_PER_LEVEL: u32 = 10;
/// Seconds between spawns at level 1
pub const BASE_SPAWN_INTERVAL: f32 = 2.5;
pub const SPAWN_INTERVAL_STEP: f32 = 0.2;
pub const MIN_SPAWN_INTERVAL: f32 = 0.8;
/// Height of the ground strip at the bottom
pub const GROUND_HEIGHT: f32 = 30.0;
const MARGIN: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: u64,
    pub text: &'static str,
    /// Letters typed so far
    pub typed: usize,
    /// Left edge of the baseline
    pub pos: Vec2,
}

impl Word {
    fn next_letter(&self) -> Option<char> {
        self.text.chars().nth(self.typed)
    }

    fn is_complete(&self) -> bool {
        self.typed >= self.text.chars().count()
    }
}

#[derive(Debug, Clone)]
pub struct TypingDefense {
    width: f32,
    height: f32,
    initial_speed: f32,
    speed_increment: f32,
    max_speed: f32,
    starting_lives: u32,
    rng_state: RngState,
    rng: Pcg32,
    next_id: u64,
    pub words: Vec<Word>,
    /// Id of the word being typed
    pub target: Option<u64>,
    pub since_spawn: f32,
    pub score: u64,
    pub lives: u32,
    pub destroyed: u32,
    pub mistakes: u32,
}

impl TypingDefense {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let mut game = Self {
            width,
            height,
            initial_speed: settings.initial_speed,
            speed_increment: settings.speed_increment,
            max_speed: settings.max_speed,
            starting_lives: settings.lives,
            rng_state,
            rng,
            next_id: 0,
            words: Vec::new(),
            target: None,
            since_spawn: 0.0,
            score: 0,
            lives: settings.lives,
            destroyed: 0,
            mistakes: 0,
        };
        game.init_game();
        game
    }

    pub fn level(&self) -> u32 {
        self.destroyed / WORDS_PER_LEVEL + 1
    }

    /// Fall speed (pixels/s) for the current level
    pub fn fall_speed(&self) -> f32 {
        (self.initial_speed + self.speed_increment * (self.level() - 1) as f32).min(self.max_speed)
    }

    pub fn spawn_interval(&self) -> f32 {
        let step = SPAWN_INTERVAL_STEP * (self.level() - 1) as f32;
        (BASE_SPAWN_INTERVAL - step).max(MIN_SPAWN_INTERVAL)
    }

    fn ground(&self) -> f32 {
        self.height - GROUND_HEIGHT
    }

    /// Drop a word at `x` (left edge) just above the field
    pub fn push_word(&mut self, text: &'static str, x: f32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.words.push(Word {
            id,
            text,
            typed: 0,
            pos: Vec2::new(x, 0.0),
        });
        id
    }

    pub fn spawn_word(&mut self) {
        let text = WORDS[self.rng.random_range(0..WORDS.len())];
        let text_width = text.len() as f32 * FONT_SIZE * 0.6;
        let max_x = (self.width - text_width - MARGIN).max(MARGIN + 1.0);
        let x = self.rng.random_range(MARGIN..max_x);
        let id = self.push_word(text, x);
        debug!("Spawned word {} '{}'", id, text);
    }

    /// Feed one typed character
    pub fn type_char(&mut self, c: char) {
        let target = match self.target {
            Some(id) => self.words.iter().position(|w| w.id == id),
            None => self
                .words
                .iter()
                .enumerate()
                .filter(|(_, w)| w.text.starts_with(c))
                .max_by(|(_, a), (_, b)| a.pos.y.total_cmp(&b.pos.y))
                .map(|(i, _)| i),
        };
        let Some(i) = target else {
            self.mistakes += 1;
            debug!("No word starts with '{}'", c);
            return;
        };

        let word = &mut self.words[i];
        if word.next_letter() != Some(c) {
            word.typed = 0;
            self.target = None;
            self.mistakes += 1;
            return;
        }
        word.typed += 1;
        self.target = Some(word.id);
        if word.is_complete() {
            let word = self.words.remove(i);
            self.target = None;
            self.destroyed += 1;
            self.score += LETTER_POINTS * word.text.len() as u64;
            if self.destroyed % WORDS_PER_LEVEL == 0 {
                info!("Typing level {}", self.level());
            }
        }
    }

    /// Move words down; returns how many hit the ground
    fn fall(&mut self, dt: f32) -> u32 {
        let step = self.fall_speed() * dt;
        let ground = self.ground();
        for word in &mut self.words {
            word.pos.y += step;
        }
        let before = self.words.len();
        let target = &mut self.target;
        self.words.retain(|w| {
            let landed = w.pos.y >= ground;
            if landed && *target == Some(w.id) {
                *target = None;
            }
            !landed
        });
        (before - self.words.len()) as u32
    }
}

impl Game for TypingDefense {
    fn kind(&self) -> GameKind {
        GameKind::Typing
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.next_id = 0;
        self.words.clear();
        self.target = None;
        self.since_spawn = 0.0;
        self.score = 0;
        self.lives = self.starting_lives;
        self.destroyed = 0;
        self.mistakes = 0;
        self.spawn_word();
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        for command in &input.commands {
            if let Command::Type(c) = *command {
                self.type_char(c);
            }
        }

        let landed = self.fall(dt);
        if landed > 0 {
            self.lives = self.lives.saturating_sub(landed);
            info!("{} word(s) landed, {} lives left", landed, self.lives);
            if self.lives == 0 {
                return Progress::GameOver;
            }
        }

        self.since_spawn += dt;
        if self.since_spawn >= self.spawn_interval() {
            self.since_spawn = 0.0;
            self.spawn_word();
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::DARK);
        let ground = self.ground();
        frame.line(Vec2::new(0.0, ground), Vec2::new(self.width, ground), 2.0, Color::GREEN);
        for word in &self.words {
            let color = if self.target == Some(word.id) { Color::WHITE } else { Color::GREY };
            frame.text(word.pos, word.text, FONT_SIZE, color, Align::Left);
            if word.typed > 0 {
                let prefix: String = word.text.chars().take(word.typed).collect();
                frame.text(word.pos, prefix, FONT_SIZE, Color::YELLOW, Align::Left);
            }
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: Some(self.lives),
            level: Some(self.level()),
        }
    }
}

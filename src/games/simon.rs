//! Simon (memory)
//!
//! The game flashes a growing sequence of pads, then waits for the player to
//! repeat it. Flashes run on a `TimerQueue` owned by the game, so a reset or
//! a stopped loop leaves nothing behind.

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::renderer::{Align, Color, Frame};
use crate::settings::Settings;
use crate::sim::collision::Rect;
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};
use crate::sim::timers::{TimerId, TimerQueue};

pub const PADS: u8 = 4;
/// Pause before a sequence plays (ms)
pub const LEAD_MS: f32 = 500.0;
/// How long a pad stays lit (ms)
pub const FLASH_MS: f32 = 400.0;
/// Dark time between flashes (ms)
pub const GAP_MS: f32 = 200.0;

/// Dim and lit colors per pad, in quadrant order
const PAD_COLORS: [(Color, Color); 4] = [
    (Color::rgb(0x1B, 0x7A, 0x43), Color::GREEN),
    (Color::rgb(0x8E, 0x2A, 0x20), Color::RED),
    (Color::rgb(0x94, 0x76, 0x09), Color::YELLOW),
    (Color::rgb(0x1F, 0x5F, 0x8B), Color::BLUE),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    On(u8),
    Off,
    /// Playback finished; hand control to the player
    Done,
}

#[derive(Debug, Clone)]
pub struct Simon {
    width: f32,
    height: f32,
    goal: u32,
    interval_ms: u32,
    rng_state: RngState,
    rng: Pcg32,
    timers: TimerQueue<Flash>,
    /// Pending unlight after a player press
    feedback: Option<TimerId>,
    pub sequence: Vec<u8>,
    /// Correct presses so far this round
    pub input_pos: usize,
    pub showing: bool,
    pub lit: Option<u8>,
    pub rounds: u32,
}

impl Simon {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let mut game = Self {
            width,
            height,
            goal: settings.winning_score,
            interval_ms: settings.interval_ms,
            rng_state,
            rng,
            timers: TimerQueue::new(),
            feedback: None,
            sequence: Vec::new(),
            input_pos: 0,
            showing: false,
            lit: None,
            rounds: 0,
        };
        game.init_game();
        game
    }

    fn extend_sequence(&mut self) {
        let pad = self.rng.random_range(0..PADS);
        self.sequence.push(pad);
    }

    /// Queue the flashes for the whole sequence
    pub fn play_sequence(&mut self) {
        self.timers.clear();
        self.feedback = None;
        self.lit = None;
        self.showing = true;
        self.input_pos = 0;
        let mut at = LEAD_MS;
        for &pad in &self.sequence {
            self.timers.schedule(at, Flash::On(pad));
            self.timers.schedule(at + FLASH_MS, Flash::Off);
            at += FLASH_MS + GAP_MS;
        }
        self.timers.schedule(at, Flash::Done);
        debug!("Playing a sequence of {}", self.sequence.len());
    }

    pub fn press(&mut self, pad: u8) -> Progress {
        if self.showing || pad >= PADS {
            return Progress::Continue;
        }
        if self.sequence.get(self.input_pos) != Some(&pad) {
            info!("Simon: wrong pad after {} rounds", self.rounds);
            return Progress::GameOver;
        }

        self.lit = Some(pad);
        if let Some(id) = self.feedback.take() {
            self.timers.cancel(id);
        }
        self.feedback = Some(self.timers.schedule(FLASH_MS * 0.5, Flash::Off));

        self.input_pos += 1;
        if self.input_pos < self.sequence.len() {
            return Progress::Continue;
        }
        self.rounds += 1;
        if self.rounds >= self.goal {
            return Progress::Victory;
        }
        self.extend_sequence();
        self.play_sequence();
        Progress::Continue
    }

    fn on_timer(&mut self, flash: Flash) {
        match flash {
            Flash::On(pad) => self.lit = Some(pad),
            Flash::Off => {
                self.lit = None;
                self.feedback = None;
            }
            Flash::Done => {
                self.showing = false;
                self.input_pos = 0;
            }
        }
    }

    /// Screen rect of a pad, matching pointer quadrants
    fn pad_rect(&self, pad: u8) -> Rect {
        let (w, h) = (self.width * 0.5, self.height * 0.5);
        let x = if pad % 2 == 1 { w } else { 0.0 };
        let y = if pad >= 2 { h } else { 0.0 };
        Rect::new(x + 4.0, y + 4.0, w - 8.0, h - 8.0)
    }
}

impl Game for Simon {
    fn kind(&self) -> GameKind {
        GameKind::Simon
    }

    fn cadence(&self) -> Cadence {
        Cadence::Fixed {
            interval_ms: self.interval_ms,
        }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.sequence.clear();
        self.rounds = 0;
        self.extend_sequence();
        self.play_sequence();
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        for flash in self.timers.advance(dt * 1000.0) {
            self.on_timer(flash);
        }
        for command in &input.commands {
            if let Command::Press(pad) = *command {
                let progress = self.press(pad);
                if progress != Progress::Continue {
                    return progress;
                }
            }
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);
        for pad in 0..PADS {
            let (dim, bright) = PAD_COLORS[pad as usize];
            let color = if self.lit == Some(pad) { bright } else { dim };
            frame.fill_rect(self.pad_rect(pad), color);
        }
        let label = if self.showing { "Watch" } else { "Your turn" };
        let center = Vec2::new(self.width * 0.5, self.height * 0.5);
        frame.text(center, label, 24.0, Color::WHITE, Align::Center);
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.rounds as u64,
            lives: None,
            level: Some(self.sequence.len() as u32),
        }
    }
}

//! Snake on a fixed-interval grid

use std::collections::VecDeque;

use glam::{IVec2, Vec2};
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::renderer::{Color, Frame, GridLayout};
use crate::settings::Settings;
use crate::sim::collision::Rect;
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

pub const INITIAL_LENGTH: usize = 3;
pub const FOOD_POINTS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Snake {
    cols: i32,
    rows: i32,
    interval_ms: u32,
    rng_state: RngState,
    rng: Pcg32,
    /// Head first
    pub body: VecDeque<IVec2>,
    /// Committed on the last tick
    pub direction: IVec2,
    /// Buffered from input, committed on the next tick
    pub next_direction: IVec2,
    /// None once the board is full
    pub food: Option<IVec2>,
    pub score: u64,
}

impl Snake {
    pub fn new(settings: &Settings, _width: f32, _height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let (cols, rows) = settings.board_size;
        let mut snake = Self {
            cols: cols as i32,
            rows: rows as i32,
            interval_ms: settings.interval_ms,
            rng_state,
            rng,
            body: VecDeque::new(),
            direction: IVec2::X,
            next_direction: IVec2::X,
            food: None,
            score: 0,
        };
        snake.init_game();
        snake
    }

    pub fn head(&self) -> IVec2 {
        self.body.front().copied().unwrap_or(IVec2::ZERO)
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.cols && cell.y < self.rows
    }

    /// Buffer a turn. Reversing onto the committed direction is rejected.
    pub fn steer(&mut self, dir: IVec2) {
        if dir == -self.direction {
            debug!("Snake reversal rejected");
            return;
        }
        self.next_direction = dir;
    }

    /// Pick a random cell the snake does not occupy
    pub fn spawn_food(&mut self) {
        let free: Vec<IVec2> = (0..self.rows)
            .flat_map(|y| (0..self.cols).map(move |x| IVec2::new(x, y)))
            .filter(|cell| !self.body.contains(cell))
            .collect();
        self.food = if free.is_empty() {
            None
        } else {
            Some(free[self.rng.random_range(0..free.len())])
        };
    }

    /// One grid step
    pub fn step(&mut self) -> Progress {
        self.direction = self.next_direction;
        let next = self.head() + self.direction;

        if !self.in_bounds(next) || self.body.contains(&next) {
            return Progress::GameOver;
        }

        self.body.push_front(next);
        if self.food == Some(next) {
            self.score += FOOD_POINTS;
            self.spawn_food();
            if self.food.is_none() {
                return Progress::Victory;
            }
        } else {
            self.body.pop_back();
        }
        Progress::Continue
    }
}

impl Game for Snake {
    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn cadence(&self) -> Cadence {
        Cadence::Fixed {
            interval_ms: self.interval_ms,
        }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        let center = IVec2::new(self.cols / 2, self.rows / 2);
        // Tail extends left of center; narrow boards get a shorter snake
        let length = INITIAL_LENGTH.min(center.x as usize + 1);
        self.body = (0..length as i32).map(|i| center - IVec2::X * i).collect();
        self.direction = IVec2::X;
        self.next_direction = IVec2::X;
        self.score = 0;
        self.spawn_food();
    }

    fn update(&mut self, input: &TickInput, _dt: f32) -> Progress {
        for command in &input.commands {
            match command {
                Command::MoveUp => self.steer(IVec2::NEG_Y),
                Command::MoveDown => self.steer(IVec2::Y),
                Command::MoveLeft => self.steer(IVec2::NEG_X),
                Command::MoveRight => self.steer(IVec2::X),
                _ => {}
            }
        }
        self.step()
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);
        let layout = GridLayout::fit(frame.width, frame.height, self.cols as u32, self.rows as u32);
        frame.stroke_rect(
            Rect {
                min: layout.origin,
                size: Vec2::new(self.cols as f32, self.rows as f32) * layout.cell,
            },
            Color::GREY,
        );
        if let Some(food) = self.food {
            frame.fill_rect(layout.cell_rect(food.y as u32, food.x as u32, 2.0), Color::RED);
        }
        for (i, seg) in self.body.iter().enumerate() {
            let color = if i == 0 { Color::YELLOW } else { Color::GREEN };
            frame.fill_rect(layout.cell_rect(seg.y as u32, seg.x as u32, 1.0), color);
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: None,
            level: None,
        }
    }
}

//! Breakout: knock out the brick wall with a paddle-driven ball

use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

use glam::Vec2;
use log::info;
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use super::paddle_ball::{Ball, Facing, Paddle, bounce_sides, bounce_top, paddle_bounce};
use crate::consts::SIM_DT;
use crate::renderer::{Color, Frame, shapes};
use crate::settings::Settings;
use crate::sim::collision::{Axis, Rect, circle_rect_overlap, reflect_velocity};
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

pub const PADDLE_WIDTH: f32 = 100.0;
pub const PADDLE_HEIGHT: f32 = 12.0;
/// Gap between the paddle and the bottom edge
pub const PADDLE_FLOOR_GAP: f32 = 30.0;
pub const PADDLE_SPEED: f32 = 480.0;
pub const PADDLE_NUDGE: f32 = 40.0;
pub const BALL_RADIUS: f32 = 8.0;
pub const BRICK_HEIGHT: f32 = 20.0;
pub const BRICK_GAP: f32 = 4.0;
/// Space above the wall for the HUD
pub const WALL_TOP: f32 = 48.0;
pub const BRICK_POINTS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickStatus {
    Active,
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brick {
    pub rect: Rect,
    pub status: BrickStatus,
    pub points: u64,
    /// Row in the wall, used for color
    pub row: u32,
}

#[derive(Debug, Clone)]
pub struct Breakout {
    width: f32,
    height: f32,
    cols: u32,
    rows: u32,
    initial_speed: f32,
    speed_increment: f32,
    max_speed: f32,
    start_lives: u32,
    rng_state: RngState,
    rng: Pcg32,
    pub paddle: Paddle,
    pub ball: Ball,
    /// Ball rides on the paddle until `Fire`
    pub attached: bool,
    pub bricks: Vec<Brick>,
    pub score: u64,
    pub lives: u32,
}

impl Breakout {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let (cols, rows) = settings.board_size;
        let mut breakout = Self {
            width,
            height,
            cols,
            rows,
            initial_speed: settings.initial_speed,
            speed_increment: settings.speed_increment,
            max_speed: settings.max_speed,
            start_lives: settings.lives,
            rng_state,
            rng,
            paddle: Paddle::new(0.0, 0.0, PADDLE_WIDTH, PADDLE_HEIGHT, Facing::Up),
            ball: Ball::launched(Vec2::ZERO, 0.0, settings.initial_speed, BALL_RADIUS),
            attached: true,
            bricks: Vec::new(),
            score: 0,
            lives: settings.lives,
        };
        breakout.init_game();
        breakout
    }

    fn build_wall(&mut self) {
        let cols = self.cols.max(1) as f32;
        let brick_w = ((self.width - BRICK_GAP * (cols + 1.0)) / cols).max(1.0);
        self.bricks = (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .map(|(row, col)| Brick {
                rect: Rect::new(
                    BRICK_GAP + col as f32 * (brick_w + BRICK_GAP),
                    WALL_TOP + row as f32 * (BRICK_HEIGHT + BRICK_GAP),
                    brick_w,
                    BRICK_HEIGHT,
                ),
                status: BrickStatus::Active,
                points: BRICK_POINTS,
                row,
            })
            .collect();
    }

    pub fn active_bricks(&self) -> usize {
        self.bricks
            .iter()
            .filter(|b| b.status == BrickStatus::Active)
            .count()
    }

    /// Put a fresh ball on the paddle. Bricks are left as they are.
    pub fn respawn_ball(&mut self) {
        self.attached = true;
        let rest = self.rest_position();
        self.ball = Ball::launched(rest, -FRAC_PI_2, self.initial_speed, BALL_RADIUS);
    }

    fn rest_position(&self) -> Vec2 {
        Vec2::new(
            self.paddle.center().x,
            self.paddle.rect.min.y - BALL_RADIUS - 1.0,
        )
    }

    pub fn launch(&mut self) {
        if !self.attached {
            return;
        }
        let angle = -FRAC_PI_2 + self.rng.random_range(-FRAC_PI_6..=FRAC_PI_6);
        self.ball = Ball::launched(self.rest_position(), angle, self.initial_speed, BALL_RADIUS);
        self.attached = false;
    }

    /// Break at most one brick per step; returns true on a hit
    fn hit_bricks(&mut self) -> bool {
        let circle = self.ball.body.circle();
        let Some(brick) = self
            .bricks
            .iter_mut()
            .find(|b| b.status == BrickStatus::Active && circle_rect_overlap(&circle, &b.rect))
        else {
            return false;
        };
        brick.status = BrickStatus::Broken;
        self.score += brick.points;
        self.ball.body.vel = reflect_velocity(self.ball.body.vel, Axis::Y);
        true
    }
}

impl Game for Breakout {
    fn kind(&self) -> GameKind {
        GameKind::Breakout
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.paddle = Paddle::new(
            (self.width - PADDLE_WIDTH) * 0.5,
            self.height - PADDLE_FLOOR_GAP - PADDLE_HEIGHT,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            Facing::Up,
        );
        self.build_wall();
        self.score = 0;
        self.lives = self.start_lives;
        self.respawn_ball();
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        for command in &input.commands {
            match command {
                Command::MoveLeft => self.paddle.slide(-PADDLE_NUDGE, self.width),
                Command::MoveRight => self.paddle.slide(PADDLE_NUDGE, self.width),
                Command::Fire => self.launch(),
                _ => {}
            }
        }
        self.paddle
            .slide(input.held.horizontal() * PADDLE_SPEED * dt, self.width);

        if self.attached {
            self.ball.body.pos = self.rest_position();
            return Progress::Continue;
        }

        self.ball.body.integrate(dt);
        bounce_sides(&mut self.ball.body, self.width);
        bounce_top(&mut self.ball.body);
        paddle_bounce(&mut self.ball, &self.paddle, self.speed_increment, self.max_speed);

        if self.hit_bricks() && self.active_bricks() == 0 {
            return Progress::Victory;
        }

        if self.ball.pos().y - self.ball.body.radius > self.height {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                return Progress::GameOver;
            }
            info!("Ball lost, {} lives left", self.lives);
            self.respawn_ball();
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::DARK);
        for brick in self.bricks.iter().filter(|b| b.status == BrickStatus::Active) {
            frame.fill_rect(brick.rect, shapes::palette(brick.row as u8 + 1));
        }
        frame.fill_rect(self.paddle.rect, Color::WHITE);
        frame.circle(self.ball.pos(), self.ball.body.radius, Color::YELLOW);
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: Some(self.lives),
            level: None,
        }
    }
}

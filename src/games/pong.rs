//! Pong: player paddle on the left, CPU paddle on the right

use std::f32::consts::{FRAC_PI_4, PI};

use glam::Vec2;
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use super::paddle_ball::{Ball, Facing, Paddle, bounce_top_bottom, paddle_bounce};
use crate::consts::SIM_DT;
use crate::renderer::{Align, Color, Frame};
use crate::settings::Settings;
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

pub const PADDLE_WIDTH: f32 = 10.0;
pub const PADDLE_HEIGHT: f32 = 100.0;
/// Gap between a paddle and its goal line
pub const PADDLE_MARGIN: f32 = 10.0;
/// Ball radius
pub const BALL_SIZE: f32 = 10.0;
/// Player paddle speed (pixels/s)
pub const PADDLE_SPEED: f32 = 360.0;
/// Distance one discrete MoveUp/MoveDown command moves the paddle
pub const PADDLE_NUDGE: f32 = 40.0;
/// CPU paddle tracking speed (pixels/s)
pub const CPU_SPEED: f32 = 270.0;
/// Serve angles are drawn from [-SERVE_ANGLE, SERVE_ANGLE]
pub const SERVE_ANGLE: f32 = FRAC_PI_4;

#[derive(Debug, Clone)]
pub struct Pong {
    width: f32,
    height: f32,
    initial_speed: f32,
    speed_increment: f32,
    max_speed: f32,
    winning_score: u32,
    rng_state: RngState,
    rng: Pcg32,
    pub player: Paddle,
    pub cpu: Paddle,
    pub ball: Ball,
    pub player_score: u32,
    pub cpu_score: u32,
    /// Paddle hits in the current rally
    pub rally: u32,
}

impl Pong {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let mut pong = Self {
            width,
            height,
            initial_speed: settings.initial_speed,
            speed_increment: settings.speed_increment,
            max_speed: settings.max_speed,
            winning_score: settings.winning_score,
            rng_state,
            rng,
            player: Paddle::new(0.0, 0.0, PADDLE_WIDTH, PADDLE_HEIGHT, Facing::Right),
            cpu: Paddle::new(0.0, 0.0, PADDLE_WIDTH, PADDLE_HEIGHT, Facing::Left),
            ball: Ball::launched(Vec2::ZERO, 0.0, settings.initial_speed, BALL_SIZE),
            player_score: 0,
            cpu_score: 0,
            rally: 0,
        };
        pong.init_game();
        pong
    }

    fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Ball back to center at base speed, heading toward `toward_cpu`'s side
    pub fn serve(&mut self, toward_cpu: bool) {
        let spread = self.rng.random_range(-SERVE_ANGLE..=SERVE_ANGLE);
        let angle = if toward_cpu { spread } else { PI - spread };
        self.ball = Ball::launched(self.center(), angle, self.initial_speed, BALL_SIZE);
        self.rally = 0;
    }

    fn move_cpu(&mut self, dt: f32) {
        // Track the ball while it approaches, drift home otherwise
        let target = if self.ball.body.vel.x > 0.0 {
            self.ball.pos().y
        } else {
            self.height * 0.5
        };
        let current = self.cpu.center().y;
        let max_step = CPU_SPEED * dt;
        let step = (target - current).clamp(-max_step, max_step);
        self.cpu.slide(step, self.height);
    }
}

impl Game for Pong {
    fn kind(&self) -> GameKind {
        GameKind::Pong
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        let paddle_y = (self.height - PADDLE_HEIGHT) * 0.5;
        self.player =
            Paddle::new(PADDLE_MARGIN, paddle_y, PADDLE_WIDTH, PADDLE_HEIGHT, Facing::Right);
        self.cpu = Paddle::new(
            self.width - PADDLE_WIDTH - PADDLE_MARGIN,
            paddle_y,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            Facing::Left,
        );
        self.player_score = 0;
        self.cpu_score = 0;
        let toward_cpu = self.rng.random_bool(0.5);
        self.serve(toward_cpu);
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        for command in &input.commands {
            match command {
                Command::MoveUp => self.player.slide(-PADDLE_NUDGE, self.height),
                Command::MoveDown => self.player.slide(PADDLE_NUDGE, self.height),
                _ => {}
            }
        }
        self.player
            .slide(input.held.vertical() * PADDLE_SPEED * dt, self.height);
        self.move_cpu(dt);

        self.ball.body.integrate(dt);
        // Walls act on vy, paddles on vx: one of each may happen per step
        bounce_top_bottom(&mut self.ball.body, self.height);
        let hit = paddle_bounce(&mut self.ball, &self.player, self.speed_increment, self.max_speed)
            || paddle_bounce(&mut self.ball, &self.cpu, self.speed_increment, self.max_speed);
        if hit {
            self.rally += 1;
        }

        let x = self.ball.pos().x;
        if x >= self.width {
            self.player_score += 1;
            debug!("Player scores: {}-{}", self.player_score, self.cpu_score);
            self.serve(true);
        } else if x <= 0.0 {
            self.cpu_score += 1;
            debug!("CPU scores: {}-{}", self.player_score, self.cpu_score);
            self.serve(false);
        }

        if self.player_score >= self.winning_score {
            Progress::Victory
        } else if self.cpu_score >= self.winning_score {
            Progress::GameOver
        } else {
            Progress::Continue
        }
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);

        // Dashed center line
        let mut y = 0.0;
        while y < self.height {
            let top = Vec2::new(self.width * 0.5, y);
            frame.line(top, top + Vec2::new(0.0, 10.0), 2.0, Color::GREY);
            y += 20.0;
        }

        frame.fill_rect(self.player.rect, Color::WHITE);
        frame.fill_rect(self.cpu.rect, Color::WHITE);
        frame.circle(self.ball.pos(), self.ball.body.radius, Color::WHITE);

        let score_y = 48.0;
        frame.text(
            Vec2::new(self.width * 0.25, score_y),
            self.player_score.to_string(),
            32.0,
            Color::WHITE,
            Align::Center,
        );
        frame.text(
            Vec2::new(self.width * 0.75, score_y),
            self.cpu_score.to_string(),
            32.0,
            Color::WHITE,
            Align::Center,
        );
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.player_score as u64,
            lives: None,
            level: None,
        }
    }
}

//! Space Invaders
//!
//! The formation marches sideways, drops a step and reverses whenever an
//! alive invader would cross an edge. March speed grows with every kill.

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::consts::SIM_DT;
use crate::renderer::{Color, Frame, shapes};
use crate::settings::Settings;
use crate::sim::collision::{Rect, rects_overlap};
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};

pub const INVADER_SIZE: Vec2 = Vec2::new(30.0, 20.0);
pub const INVADER_GAP: f32 = 12.0;
pub const FORMATION_TOP: f32 = 60.0;
/// Edge margin the formation turns at
pub const FORMATION_MARGIN: f32 = 10.0;
/// Drop per edge reversal
pub const STEP_DOWN: f32 = 16.0;

pub const CANNON_SIZE: Vec2 = Vec2::new(40.0, 16.0);
pub const CANNON_FLOOR_GAP: f32 = 24.0;
pub const CANNON_SPEED: f32 = 300.0;

pub const SHOT_SIZE: Vec2 = Vec2::new(3.0, 12.0);
pub const PLAYER_SHOT_SPEED: f32 = 520.0;
pub const ENEMY_SHOT_SPEED: f32 = 200.0;
pub const MAX_ENEMY_SHOTS: usize = 3;
/// Expected enemy shots per second
pub const ENEMY_FIRE_RATE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invader {
    pub rect: Rect,
    pub alive: bool,
    pub row: u32,
    pub col: u32,
}

impl Invader {
    /// Top rows are worth more
    pub fn points(&self) -> u64 {
        match self.row {
            0 => 30,
            1 | 2 => 20,
            _ => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub rect: Rect,
    /// Vertical speed (pixels/s), negative is up
    pub vy: f32,
}

impl Shot {
    fn from_center(center: Vec2, vy: f32) -> Self {
        Self {
            rect: Rect {
                min: center - SHOT_SIZE * 0.5,
                size: SHOT_SIZE,
            },
            vy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Invaders {
    width: f32,
    height: f32,
    cols: u32,
    rows: u32,
    march_speed: f32,
    speed_increment: f32,
    max_speed: f32,
    start_lives: u32,
    rng_state: RngState,
    rng: Pcg32,
    pub invaders: Vec<Invader>,
    /// +1 marching right, -1 left
    pub heading: f32,
    pub cannon: Rect,
    pub player_shot: Option<Shot>,
    pub enemy_shots: Vec<Shot>,
    pub score: u64,
    pub lives: u32,
}

impl Invaders {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let (cols, rows) = settings.board_size;
        let mut game = Self {
            width,
            height,
            cols,
            rows,
            march_speed: settings.initial_speed,
            speed_increment: settings.speed_increment,
            max_speed: settings.max_speed,
            start_lives: settings.lives,
            rng_state,
            rng,
            invaders: Vec::new(),
            heading: 1.0,
            cannon: Rect::new(0.0, 0.0, CANNON_SIZE.x, CANNON_SIZE.y),
            player_shot: None,
            enemy_shots: Vec::new(),
            score: 0,
            lives: settings.lives,
        };
        game.init_game();
        game
    }

    fn build_formation(&mut self) {
        let pitch = INVADER_SIZE + Vec2::splat(INVADER_GAP);
        let span = pitch.x * self.cols as f32 - INVADER_GAP;
        let left = ((self.width - span) * 0.5).max(FORMATION_MARGIN);
        self.invaders = (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .map(|(row, col)| Invader {
                rect: Rect {
                    min: Vec2::new(left, FORMATION_TOP) + pitch * Vec2::new(col as f32, row as f32),
                    size: INVADER_SIZE,
                },
                alive: true,
                row,
                col,
            })
            .collect();
    }

    pub fn alive(&self) -> usize {
        self.invaders.iter().filter(|i| i.alive).count()
    }

    /// Current march speed (pixels/s)
    pub fn speed(&self) -> f32 {
        let killed = self.invaders.len() - self.alive();
        (self.march_speed + self.speed_increment * killed as f32).min(self.max_speed)
    }

    fn march(&mut self, dt: f32) {
        let dx = self.heading * self.speed() * dt;
        let (min_x, max_x) = self
            .invaders
            .iter()
            .filter(|i| i.alive)
            .fold((f32::MAX, f32::MIN), |(lo, hi), i| {
                (lo.min(i.rect.min.x), hi.max(i.rect.max().x))
            });
        let hits_edge = min_x + dx < FORMATION_MARGIN || max_x + dx > self.width - FORMATION_MARGIN;

        let step = if hits_edge {
            self.heading = -self.heading;
            Vec2::new(0.0, STEP_DOWN)
        } else {
            Vec2::new(dx, 0.0)
        };
        for invader in &mut self.invaders {
            invader.rect.min += step;
        }
    }

    fn fire(&mut self) {
        if self.player_shot.is_some() {
            return;
        }
        let muzzle = Vec2::new(self.cannon.center().x, self.cannon.min.y);
        self.player_shot = Some(Shot::from_center(muzzle, -PLAYER_SHOT_SPEED));
    }

    /// A random column's lowest alive invader may shoot
    fn enemy_fire(&mut self, dt: f32) {
        if self.enemy_shots.len() >= MAX_ENEMY_SHOTS {
            return;
        }
        let chance = (ENEMY_FIRE_RATE * dt as f64).clamp(0.0, 1.0);
        if !self.rng.random_bool(chance) {
            return;
        }
        let col = self.rng.random_range(0..self.cols.max(1));
        let shooter = self
            .invaders
            .iter()
            .filter(|i| i.alive && i.col == col)
            .max_by(|a, b| a.rect.min.y.total_cmp(&b.rect.min.y));
        if let Some(shooter) = shooter {
            let muzzle = Vec2::new(shooter.rect.center().x, shooter.rect.max().y);
            self.enemy_shots.push(Shot::from_center(muzzle, ENEMY_SHOT_SPEED));
        }
    }

    fn move_shots(&mut self, dt: f32) {
        let height = self.height;
        if let Some(shot) = &mut self.player_shot {
            shot.rect.min.y += shot.vy * dt;
            if shot.rect.max().y < 0.0 {
                self.player_shot = None;
            }
        }
        for shot in &mut self.enemy_shots {
            shot.rect.min.y += shot.vy * dt;
        }
        self.enemy_shots.retain(|s| s.rect.min.y < height);
    }

    fn resolve_player_shot(&mut self) {
        let Some(shot) = self.player_shot else {
            return;
        };
        if let Some(invader) = self
            .invaders
            .iter_mut()
            .find(|i| i.alive && rects_overlap(&i.rect, &shot.rect))
        {
            invader.alive = false;
            self.score += invader.points();
            self.player_shot = None;
            debug!("Invader down, {} left", self.alive());
        }
    }

    /// True if an enemy shot struck the cannon
    fn resolve_enemy_shots(&mut self) -> bool {
        let cannon = self.cannon;
        let before = self.enemy_shots.len();
        self.enemy_shots.retain(|s| !rects_overlap(&s.rect, &cannon));
        self.enemy_shots.len() != before
    }

    fn invaded(&self) -> bool {
        self.invaders
            .iter()
            .any(|i| i.alive && i.rect.max().y >= self.cannon.min.y)
    }
}

impl Game for Invaders {
    fn kind(&self) -> GameKind {
        GameKind::Invaders
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.build_formation();
        self.heading = 1.0;
        self.cannon = Rect {
            min: Vec2::new(
                (self.width - CANNON_SIZE.x) * 0.5,
                self.height - CANNON_FLOOR_GAP - CANNON_SIZE.y,
            ),
            size: CANNON_SIZE,
        };
        self.player_shot = None;
        self.enemy_shots.clear();
        self.score = 0;
        self.lives = self.start_lives;
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        if input.commands.contains(&Command::Fire) || input.held.fire {
            self.fire();
        }
        let max_x = (self.width - self.cannon.size.x).max(0.0);
        let step = input.held.horizontal() * CANNON_SPEED * dt;
        self.cannon.min.x = (self.cannon.min.x + step).clamp(0.0, max_x);

        self.march(dt);
        self.enemy_fire(dt);
        self.move_shots(dt);
        self.resolve_player_shot();

        if self.alive() == 0 {
            return Progress::Victory;
        }
        if self.invaded() {
            info!("Invaders reached the cannon");
            return Progress::GameOver;
        }
        if self.resolve_enemy_shots() {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                return Progress::GameOver;
            }
            self.enemy_shots.clear();
            debug!("Cannon hit, {} lives left", self.lives);
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);
        for invader in self.invaders.iter().filter(|i| i.alive) {
            frame.fill_rect(invader.rect, shapes::palette(invader.row as u8 + 1));
        }
        frame.fill_rect(self.cannon, Color::GREEN);
        if let Some(shot) = self.player_shot {
            frame.fill_rect(shot.rect, Color::WHITE);
        }
        for shot in &self.enemy_shots {
            frame.fill_rect(shot.rect, Color::RED);
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: Some(self.lives),
            level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invaders() -> Invaders {
        Invaders::new(&Settings::for_game(GameKind::Invaders), 800.0, 600.0)
    }

    fn fire() -> TickInput {
        TickInput::with_commands([Command::Fire])
    }

    #[test]
    fn test_formation_layout() {
        let game = invaders();
        assert_eq!(game.invaders.len(), 55);
        assert_eq!(game.alive(), 55);
        assert!(game.invaders.iter().all(|i| i.rect.min.x >= FORMATION_MARGIN));
        assert!(!game.invaded());
    }

    #[test]
    fn test_march_reverses_and_steps_down_at_edge() {
        let mut game = invaders();
        let right = game.invaders.iter().map(|i| i.rect.max().x).fold(f32::MIN, f32::max);
        let shift = 800.0 - FORMATION_MARGIN - right - 0.1;
        for invader in &mut game.invaders {
            invader.rect.min.x += shift;
        }
        let top = game.invaders[0].rect.min.y;

        game.march(0.1);
        assert_eq!(game.heading, -1.0);
        assert_eq!(game.invaders[0].rect.min.y, top + STEP_DOWN);

        let x = game.invaders[0].rect.min.x;
        game.march(0.1);
        assert!(game.invaders[0].rect.min.x < x);
    }

    #[test]
    fn test_speed_grows_with_kills() {
        let mut game = invaders();
        let base = game.speed();
        game.invaders[0].alive = false;
        game.invaders[1].alive = false;
        assert_eq!(game.speed(), base + 2.0 * game.speed_increment);
    }

    #[test]
    fn test_one_player_shot_at_a_time() {
        let mut game = invaders();
        game.fire();
        let first = game.player_shot;
        game.fire();
        assert_eq!(game.player_shot, first);
    }

    #[test]
    fn test_shot_kills_invader() {
        let mut game = invaders();
        let target = game.invaders[0];
        game.player_shot = Some(Shot::from_center(target.rect.center(), -PLAYER_SHOT_SPEED));
        game.resolve_player_shot();
        assert!(!game.invaders[0].alive);
        assert_eq!(game.score, 30);
        assert!(game.player_shot.is_none());
    }

    #[test]
    fn test_missed_shot_leaves_screen() {
        let mut game = invaders();
        game.update(&fire(), SIM_DT);
        assert!(game.player_shot.is_some());
        game.player_shot = Some(Shot::from_center(Vec2::new(5.0, 2.0), -PLAYER_SHOT_SPEED));
        game.move_shots(0.1);
        assert!(game.player_shot.is_none());
    }

    #[test]
    fn test_enemy_shot_costs_life() {
        let mut game = invaders();
        game.enemy_shots.push(Shot::from_center(game.cannon.center(), ENEMY_SHOT_SPEED));
        assert!(game.resolve_enemy_shots());
        assert!(game.enemy_shots.is_empty());

        game.enemy_shots.push(Shot::from_center(game.cannon.center(), ENEMY_SHOT_SPEED));
        game.lives = 1;
        // Make sure nothing else ends the step
        assert_eq!(game.update(&TickInput::default(), SIM_DT), Progress::GameOver);
    }

    #[test]
    fn test_reaching_cannon_row_is_game_over() {
        let mut game = invaders();
        for invader in &mut game.invaders {
            invader.rect.min.y += 400.0;
        }
        assert_eq!(game.update(&TickInput::default(), SIM_DT), Progress::GameOver);
    }

    #[test]
    fn test_cleared_formation_is_victory() {
        let mut game = invaders();
        for invader in game.invaders.iter_mut().skip(1) {
            invader.alive = false;
        }
        let target = game.invaders[0];
        let aim = target.rect.center() + Vec2::new(0.0, 5.0);
        game.player_shot = Some(Shot::from_center(aim, -PLAYER_SHOT_SPEED));
        assert_eq!(game.update(&TickInput::default(), SIM_DT), Progress::Victory);
    }
}

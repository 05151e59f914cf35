//! Asteroids
//!
//! Everything lives on a torus: ship, bullets and rocks wrap at the edges.
//! Large rocks split into two medium, medium into two small; small rocks are
//! destroyed outright.

use std::f32::consts::TAU;

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use rand_pcg::Pcg32;

use super::GameKind;
use crate::consts::SIM_DT;
use crate::renderer::{Color, Frame, shapes};
use crate::settings::Settings;
use crate::sim::collision::{MovingBody, circles_collide, wrap_position};
use crate::sim::state::{Command, Progress, RngState, Stats, TickInput};
use crate::sim::tick::{Cadence, Game};
use crate::{normalize_angle, polar_to_cartesian};

pub const SHIP_RADIUS: f32 = 12.0;
/// Turn rate (rad/s)
pub const SHIP_TURN_RATE: f32 = 3.5;
/// Thrust acceleration (pixels/s^2)
pub const SHIP_THRUST: f32 = 240.0;
pub const SHIP_MAX_SPEED: f32 = 400.0;
/// Velocity kept per second with no thrust
pub const SHIP_DRAG: f32 = 0.5;
/// Invulnerability after a respawn (ms)
pub const RESPAWN_GRACE_MS: f32 = 2000.0;

pub const BULLET_SPEED: f32 = 500.0;
pub const BULLET_TTL: f32 = 1.0;
pub const BULLET_RADIUS: f32 = 2.0;
pub const MAX_BULLETS: usize = 5;
/// Minimum time between shots (s)
pub const FIRE_COOLDOWN: f32 = 0.15;

pub const STARTING_ROCKS: u32 = 3;
/// Rocks spawn at least this far from the ship
pub const SAFE_DISTANCE: f32 = 150.0;
const JAG_POINTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RockSize {
    Large,
    Medium,
    Small,
}

impl RockSize {
    pub fn radius(self) -> f32 {
        match self {
            RockSize::Large => 40.0,
            RockSize::Medium => 20.0,
            RockSize::Small => 10.0,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            RockSize::Large => 20,
            RockSize::Medium => 50,
            RockSize::Small => 100,
        }
    }

    /// Smaller rocks move faster
    pub fn speed_scale(self) -> f32 {
        match self {
            RockSize::Large => 1.0,
            RockSize::Medium => 1.5,
            RockSize::Small => 2.0,
        }
    }

    pub fn split(self) -> Option<RockSize> {
        match self {
            RockSize::Large => Some(RockSize::Medium),
            RockSize::Medium => Some(RockSize::Small),
            RockSize::Small => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rock {
    pub body: MovingBody,
    pub size: RockSize,
    /// Outline radius multipliers
    pub jag: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub body: MovingBody,
    /// Seconds left to live
    pub ttl: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ship {
    pub body: MovingBody,
    /// Heading in radians, 0 = +x
    pub angle: f32,
    /// Remaining invulnerability (ms)
    pub grace_ms: f32,
    pub thrusting: bool,
}

impl Ship {
    fn spawn(pos: Vec2) -> Self {
        Self {
            body: MovingBody::new(pos, Vec2::ZERO, SHIP_RADIUS),
            angle: -std::f32::consts::FRAC_PI_2,
            grace_ms: RESPAWN_GRACE_MS,
            thrusting: false,
        }
    }

    pub fn invulnerable(&self) -> bool {
        self.grace_ms > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct Asteroids {
    width: f32,
    height: f32,
    rock_speed: f32,
    speed_increment: f32,
    max_speed: f32,
    start_lives: u32,
    rng_state: RngState,
    rng: Pcg32,
    pub ship: Ship,
    pub bullets: Vec<Bullet>,
    pub rocks: Vec<Rock>,
    pub cooldown: f32,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
}

impl Asteroids {
    pub fn new(settings: &Settings, width: f32, height: f32) -> Self {
        let rng_state = RngState::new(settings.seed);
        let rng = rng_state.to_rng();
        let mut game = Self {
            width,
            height,
            rock_speed: settings.initial_speed,
            speed_increment: settings.speed_increment,
            max_speed: settings.max_speed,
            start_lives: settings.lives,
            rng_state,
            rng,
            ship: Ship::spawn(Vec2::new(width * 0.5, height * 0.5)),
            bullets: Vec::new(),
            rocks: Vec::new(),
            cooldown: 0.0,
            score: 0,
            lives: settings.lives,
            level: 1,
        };
        game.init_game();
        game
    }

    fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Base rock speed for the current wave
    fn wave_speed(&self) -> f32 {
        (self.rock_speed + self.speed_increment * (self.level - 1) as f32).min(self.max_speed)
    }

    pub fn make_rock(&mut self, pos: Vec2, size: RockSize) -> Rock {
        let heading = self.rng.random_range(0.0..TAU);
        let speed = self.wave_speed() * size.speed_scale();
        let jag = (0..JAG_POINTS)
            .map(|_| self.rng.random_range(0.75..1.15))
            .collect();
        Rock {
            body: MovingBody::new(pos, Vec2::from_angle(heading) * speed, size.radius()),
            size,
            jag,
        }
    }

    /// Fill the field with `STARTING_ROCKS + level - 1` large rocks away from the ship
    pub fn spawn_wave(&mut self) {
        let count = STARTING_ROCKS + self.level - 1;
        let reach = SAFE_DISTANCE.max(self.width.min(self.height) * 0.4);
        self.rocks.clear();
        for _ in 0..count {
            let bearing = self.rng.random_range(0.0..TAU);
            let pos = wrap_position(
                self.ship.body.pos + polar_to_cartesian(reach, bearing),
                self.width,
                self.height,
            );
            let rock = self.make_rock(pos, RockSize::Large);
            self.rocks.push(rock);
        }
        info!("Asteroids wave {} with {} rocks", self.level, count);
    }

    fn fire(&mut self) {
        if self.cooldown > 0.0 || self.bullets.len() >= MAX_BULLETS {
            return;
        }
        let dir = Vec2::from_angle(self.ship.angle);
        self.bullets.push(Bullet {
            body: MovingBody::new(
                self.ship.body.pos + dir * SHIP_RADIUS,
                self.ship.body.vel + dir * BULLET_SPEED,
                BULLET_RADIUS,
            ),
            ttl: BULLET_TTL,
        });
        self.cooldown = FIRE_COOLDOWN;
    }

    fn steer_ship(&mut self, input: &TickInput, dt: f32) {
        let ship = &mut self.ship;
        ship.angle = normalize_angle(ship.angle + input.held.horizontal() * SHIP_TURN_RATE * dt);
        ship.thrusting = input.held.up;
        if ship.thrusting {
            ship.body.vel += Vec2::from_angle(ship.angle) * SHIP_THRUST * dt;
        } else {
            ship.body.vel *= SHIP_DRAG.powf(dt);
        }
        ship.body.vel = ship.body.vel.clamp_length_max(SHIP_MAX_SPEED);
        ship.body.integrate(dt);
        ship.body.pos = wrap_position(ship.body.pos, self.width, self.height);
        ship.grace_ms = (ship.grace_ms - dt * 1000.0).max(0.0);
    }

    fn move_debris(&mut self, dt: f32) {
        let (w, h) = (self.width, self.height);
        for bullet in &mut self.bullets {
            bullet.body.integrate(dt);
            bullet.body.pos = wrap_position(bullet.body.pos, w, h);
            bullet.ttl -= dt;
        }
        self.bullets.retain(|b| b.ttl > 0.0);
        for rock in &mut self.rocks {
            rock.body.integrate(dt);
            rock.body.pos = wrap_position(rock.body.pos, w, h);
        }
    }

    /// Bullet/rock hits: each bullet destroys at most one rock
    fn resolve_shots(&mut self) {
        let mut hits: Vec<usize> = Vec::new();
        self.bullets.retain(|bullet| {
            let hit = self
                .rocks
                .iter()
                .enumerate()
                .find(|(i, rock)| {
                    !hits.contains(i) && circles_collide(&bullet.body.circle(), &rock.body.circle())
                })
                .map(|(i, _)| i);
            match hit {
                Some(i) => {
                    hits.push(i);
                    false
                }
                None => true,
            }
        });

        hits.sort_unstable_by(|a, b| b.cmp(a));
        for i in hits {
            let rock = self.rocks.swap_remove(i);
            self.score += rock.size.points();
            if let Some(smaller) = rock.size.split() {
                for _ in 0..2 {
                    let child = self.make_rock(rock.body.pos, smaller);
                    self.rocks.push(child);
                }
            }
        }
    }

    fn ship_hit(&self) -> bool {
        !self.ship.invulnerable()
            && self
                .rocks
                .iter()
                .any(|rock| circles_collide(&self.ship.body.circle(), &rock.body.circle()))
    }
}

impl Game for Asteroids {
    fn kind(&self) -> GameKind {
        GameKind::Asteroids
    }

    fn cadence(&self) -> Cadence {
        Cadence::Frame { step: SIM_DT }
    }

    fn init_game(&mut self) {
        self.rng = self.rng_state.to_rng();
        self.ship = Ship::spawn(self.center());
        self.bullets.clear();
        self.cooldown = 0.0;
        self.score = 0;
        self.lives = self.start_lives;
        self.level = 1;
        self.spawn_wave();
    }

    fn update(&mut self, input: &TickInput, dt: f32) -> Progress {
        self.cooldown = (self.cooldown - dt).max(0.0);
        for command in &input.commands {
            if *command == Command::Fire {
                self.fire();
            }
        }
        if input.held.fire {
            self.fire();
        }

        self.steer_ship(input, dt);
        self.move_debris(dt);
        self.resolve_shots();

        if self.ship_hit() {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                return Progress::GameOver;
            }
            debug!("Ship destroyed, {} lives left", self.lives);
            self.ship = Ship::spawn(self.center());
        }

        if self.rocks.is_empty() {
            self.level += 1;
            self.spawn_wave();
        }
        Progress::Continue
    }

    fn render(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);
        for rock in &self.rocks {
            frame.polygon(
                shapes::rock_outline(rock.body.pos, rock.body.radius, &rock.jag),
                Color::GREY,
            );
        }
        for bullet in &self.bullets {
            frame.circle(bullet.body.pos, bullet.body.radius, Color::WHITE);
        }
        if self.ship.invulnerable() {
            frame.ring(self.ship.body.pos, SHIP_RADIUS * 1.6, Color::BLUE);
        }
        // Blink while invulnerable
        let visible = !self.ship.invulnerable() || (self.ship.grace_ms / 100.0) as u32 % 2 == 0;
        if visible {
            frame.polygon(
                shapes::ship_outline(self.ship.body.pos, self.ship.angle, SHIP_RADIUS),
                Color::WHITE,
            );
            if self.ship.thrusting {
                let tail = self.ship.body.pos - Vec2::from_angle(self.ship.angle) * SHIP_RADIUS;
                frame.circle(tail, 3.0, Color::YELLOW);
            }
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            score: self.score,
            lives: Some(self.lives),
            level: Some(self.level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DrawCommand;
    use crate::sim::state::HeldControls;
    use proptest::prelude::*;

    fn asteroids() -> Asteroids {
        Asteroids::new(&Settings::for_game(GameKind::Asteroids), 800.0, 600.0)
    }

    fn still_rock(game: &mut Asteroids, pos: Vec2, size: RockSize) -> Rock {
        let mut rock = game.make_rock(pos, size);
        rock.body.vel = Vec2::ZERO;
        rock
    }

    #[test]
    fn test_first_wave_keeps_distance() {
        let game = asteroids();
        assert_eq!(game.rocks.len(), STARTING_ROCKS as usize);
        for rock in &game.rocks {
            assert!(!circles_collide(&game.ship.body.circle(), &rock.body.circle()));
        }
        assert!(game.ship.invulnerable());
    }

    #[test]
    fn test_turn_and_thrust() {
        let mut game = asteroids();
        game.rocks.clear();
        let held = TickInput {
            held: HeldControls {
                up: true,
                right: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let start = game.ship.body.pos;
        game.steer_ship(&held, 0.5);
        assert!(game.ship.angle > -std::f32::consts::FRAC_PI_2);
        assert!(game.ship.body.vel.length() > 0.0);
        assert_ne!(game.ship.body.pos, start);
        assert!(game.ship.body.vel.length() <= SHIP_MAX_SPEED);
    }

    #[test]
    fn test_ship_wraps_at_edge() {
        let mut game = asteroids();
        game.rocks.clear();
        game.ship.body.pos = Vec2::new(799.0, 300.0);
        game.ship.body.vel = Vec2::new(400.0, 0.0);
        game.steer_ship(&TickInput::default(), 0.05);
        assert!(game.ship.body.pos.x < 100.0);
    }

    #[test]
    fn test_large_rock_splits_into_two_medium() {
        let mut game = asteroids();
        let rock = still_rock(&mut game, Vec2::new(100.0, 100.0), RockSize::Large);
        game.rocks = vec![rock];
        game.bullets = vec![Bullet {
            body: MovingBody::new(Vec2::new(100.0, 100.0), Vec2::ZERO, BULLET_RADIUS),
            ttl: 1.0,
        }];
        game.resolve_shots();
        assert!(game.bullets.is_empty());
        assert_eq!(game.rocks.len(), 2);
        assert!(game.rocks.iter().all(|r| r.size == RockSize::Medium));
        assert_eq!(game.score, 20);
    }

    #[test]
    fn test_small_rock_destroyed() {
        let mut game = asteroids();
        let rock = still_rock(&mut game, Vec2::new(100.0, 100.0), RockSize::Small);
        game.rocks = vec![rock];
        game.bullets = vec![Bullet {
            body: MovingBody::new(Vec2::new(105.0, 100.0), Vec2::ZERO, BULLET_RADIUS),
            ttl: 1.0,
        }];
        game.resolve_shots();
        assert!(game.rocks.is_empty());
        assert_eq!(game.score, 100);
    }

    #[test]
    fn test_fire_respects_cooldown_and_cap() {
        let mut game = asteroids();
        game.fire();
        game.fire();
        assert_eq!(game.bullets.len(), 1);
        for _ in 0..20 {
            game.cooldown = 0.0;
            game.fire();
        }
        assert_eq!(game.bullets.len(), MAX_BULLETS);
    }

    #[test]
    fn test_bullets_expire() {
        let mut game = asteroids();
        game.rocks.clear();
        game.fire();
        game.move_debris(BULLET_TTL + 0.01);
        assert!(game.bullets.is_empty());
    }

    #[test]
    fn test_collision_costs_life_and_grants_grace() {
        let mut game = asteroids();
        game.ship.grace_ms = 0.0;
        let pos = game.ship.body.pos;
        let rock = still_rock(&mut game, pos, RockSize::Medium);
        game.rocks = vec![rock];

        assert_eq!(game.update(&TickInput::default(), SIM_DT), Progress::Continue);
        assert_eq!(game.lives, 2);
        assert!(game.ship.invulnerable());
        // Still overlapping, but protected
        game.update(&TickInput::default(), SIM_DT);
        assert_eq!(game.lives, 2);
    }

    #[test]
    fn test_shield_ring_only_during_grace() {
        let shield = |game: &Asteroids| {
            let mut frame = Frame::new(800.0, 600.0);
            game.render(&mut frame);
            frame
                .commands
                .iter()
                .filter(|c| matches!(c, DrawCommand::Circle { filled: false, .. }))
                .count()
        };
        let mut game = asteroids();
        assert!(game.ship.invulnerable());
        assert_eq!(shield(&game), 1);
        game.ship.grace_ms = 0.0;
        assert_eq!(shield(&game), 0);
    }

    #[test]
    fn test_last_life_is_game_over() {
        let mut game = asteroids();
        game.lives = 1;
        game.ship.grace_ms = 0.0;
        let pos = game.ship.body.pos;
        let rock = still_rock(&mut game, pos, RockSize::Small);
        game.rocks = vec![rock];
        assert_eq!(game.update(&TickInput::default(), SIM_DT), Progress::GameOver);
    }

    #[test]
    fn test_cleared_field_starts_next_wave() {
        let mut game = asteroids();
        game.rocks.clear();
        game.update(&TickInput::default(), SIM_DT);
        assert_eq!(game.level, 2);
        assert_eq!(game.rocks.len(), STARTING_ROCKS as usize + 1);
    }

    proptest! {
        #[test]
        fn prop_positions_stay_on_field(steps in 1usize..200, up: bool, left: bool, fire: bool) {
            let mut game = asteroids();
            let input = TickInput {
                held: HeldControls { up, left, fire, ..Default::default() },
                ..Default::default()
            };
            for _ in 0..steps {
                if game.update(&input, SIM_DT * 4.0) == Progress::GameOver {
                    break;
                }
                let p = game.ship.body.pos;
                prop_assert!(p.is_finite());
                prop_assert!(p.x >= 0.0 && p.x < 800.0 && p.y >= 0.0 && p.y < 600.0);
                for rock in &game.rocks {
                    prop_assert!(rock.body.pos.is_finite());
                }
            }
        }
    }
}

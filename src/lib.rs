//! Arcade Sim - real-time arcade game simulations
//!
//! Core modules:
//! - `sim`: Loop driver, scheduling, collision primitives, shared state types
//! - `games`: Per-game simulation rules (Pong, Tetris, Snake, ...)
//! - `input`: Raw key/pointer events to normalized commands
//! - `renderer`: Backend-agnostic draw commands
//! - `settings`: Per-game tunables

pub mod error;
pub mod games;
pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use games::{GameKind, mount};
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Loop configuration constants
pub mod consts {
    /// Fixed simulation timestep for frame-cadence games (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta the driver will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

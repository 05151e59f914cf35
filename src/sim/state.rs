//! Shared state types for every game
//!
//! The loop driver owns the phase; games own everything else and report
//! their counters through `Stats`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Mounted, waiting for `start()`
    Start,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Loss condition reached
    GameOver,
    /// Win condition reached
    Victory,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spin {
    Clockwise,
    CounterClockwise,
}

/// Normalized one-shot commands produced by the input adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Fire,
    Rotate(Spin),
    /// Toggle a flag on (row, col)
    Flag(u32, u32),
    /// Reveal (row, col)
    Reveal(u32, u32),
    /// Toggle a wall on (row, col)
    PlaceWall(u32, u32),
    /// A typed character
    Type(char),
    /// A numbered pad (Simon)
    Press(u8),
    /// Pause toggle, handled by the loop driver
    Pause,
}

/// Controls held down across frames (continuous movement)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldControls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl HeldControls {
    /// -1 for up, +1 for down, 0 for neither or both
    pub fn vertical(&self) -> f32 {
        (self.down as i8 - self.up as i8) as f32
    }

    /// -1 for left, +1 for right, 0 for neither or both
    pub fn horizontal(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }
}

/// Input for a single simulation step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// One-shot commands, delivered on the first step of a frame only
    pub commands: Vec<Command>,
    /// Held controls, delivered on every step
    pub held: HeldControls,
}

impl TickInput {
    pub fn with_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            held: HeldControls::default(),
        }
    }
}

/// What a simulation step concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    GameOver,
    Victory,
}

/// Counters a game exposes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub score: u64,
    pub lives: Option<u32>,
    pub level: Option<u32>,
}

/// Read-only projection published once per tick for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub score: u64,
    pub lives: Option<u32>,
    pub level: Option<u32>,
    pub phase: GamePhase,
}

impl Snapshot {
    pub fn new(stats: Stats, phase: GamePhase) -> Self {
        Self {
            score: stats.score,
            lives: stats.lives,
            level: stats.level,
            phase,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with no maps or non-finite floats; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// RNG state wrapper; every match reseeds from the same seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

//! Game rules and the mount entry point
//!
//! Each module implements `Game` for one title. `mount` validates settings,
//! builds the game for the surface size and hands it to a `GameLoop`.

pub mod asteroids;
pub mod breakout;
pub mod invaders;
pub mod merge2048;
pub mod minesweeper;
pub mod paddle_ball;
pub mod pathfinding;
pub mod pong;
pub mod routing;
pub mod simon;
pub mod snake;
pub mod tetris;
pub mod typing;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::renderer::RenderSurface;
use crate::settings::Settings;
use crate::sim::scheduler::Scheduler;
use crate::sim::tick::{Game, GameLoop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Pong,
    Breakout,
    Snake,
    Tetris,
    Asteroids,
    Invaders,
    Minesweeper,
    Merge2048,
    Pathfinding,
    Typing,
    Simon,
}

impl GameKind {
    pub const ALL: [GameKind; 11] = [
        GameKind::Pong,
        GameKind::Breakout,
        GameKind::Snake,
        GameKind::Tetris,
        GameKind::Asteroids,
        GameKind::Invaders,
        GameKind::Minesweeper,
        GameKind::Merge2048,
        GameKind::Pathfinding,
        GameKind::Typing,
        GameKind::Simon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Pong => "Pong",
            GameKind::Breakout => "Breakout",
            GameKind::Snake => "Snake",
            GameKind::Tetris => "Tetris",
            GameKind::Asteroids => "Asteroids",
            GameKind::Invaders => "Invaders",
            GameKind::Minesweeper => "Minesweeper",
            GameKind::Merge2048 => "2048",
            GameKind::Pathfinding => "Pathfinding",
            GameKind::Typing => "Typing",
            GameKind::Simon => "Simon",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().to_lowercase() == s)
            .or(match s.as_str() {
                "merge2048" => Some(GameKind::Merge2048),
                "bfs" => Some(GameKind::Pathfinding),
                "memory" => Some(GameKind::Simon),
                _ => None,
            })
    }
}

/// Build a fresh game for a `width` x `height` surface
pub fn create(kind: GameKind, settings: &Settings, width: f32, height: f32) -> Box<dyn Game> {
    match kind {
        GameKind::Pong => Box::new(pong::Pong::new(settings, width, height)),
        GameKind::Breakout => Box::new(breakout::Breakout::new(settings, width, height)),
        GameKind::Snake => Box::new(snake::Snake::new(settings, width, height)),
        GameKind::Tetris => Box::new(tetris::Tetris::new(settings, width, height)),
        GameKind::Asteroids => Box::new(asteroids::Asteroids::new(settings, width, height)),
        GameKind::Invaders => Box::new(invaders::Invaders::new(settings, width, height)),
        GameKind::Minesweeper => Box::new(minesweeper::Minesweeper::new(settings, width, height)),
        GameKind::Merge2048 => Box::new(merge2048::Merge2048::new(settings, width, height)),
        GameKind::Pathfinding => {
            Box::new(pathfinding::PathfindingDemo::new(settings, width, height))
        }
        GameKind::Typing => Box::new(typing::TypingDefense::new(settings, width, height)),
        GameKind::Simon => Box::new(simon::Simon::new(settings, width, height)),
    }
}

/// Validate `settings` and mount `kind` on `surface`. The loop starts in
/// the `Start` phase; call `start()` to begin.
pub fn mount<S: Scheduler, R: RenderSurface>(
    kind: GameKind,
    surface: R,
    scheduler: S,
    settings: &Settings,
) -> Result<GameLoop<S, R>, ConfigError> {
    settings.validate()?;
    let (width, height) = surface.size();
    if !(width > 0.0 && height > 0.0) {
        return Err(ConfigError::NonPositive { field: "surface" });
    }
    info!(
        "Mounting {} on {}x{} (seed {:#x}, {})",
        kind.name(),
        width,
        height,
        settings.seed,
        settings.difficulty.as_str()
    );
    let game = create(kind, settings, width, height);
    Ok(GameLoop::new(game, scheduler, surface))
}

//! Mount-time errors
//!
//! Simulation steps never fail; only rejecting a bad configuration does.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board must have at least one row and one column (got {cols}x{rows})")]
    EmptyBoard { cols: u32, rows: u32 },
    #[error("board of {cols}x{rows} exceeds {max} cells")]
    BoardTooLarge { cols: u32, rows: u32, max: u64 },
    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: u32, cells: u32 },
    #[error("initial speed {initial} must be positive and not exceed max speed {max}")]
    SpeedRange { initial: f32, max: f32 },
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

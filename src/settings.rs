//! Game tunables
//!
//! Everything a host can pass at mount time. Nothing here is persisted; a
//! fresh mount always starts from these values.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::games::GameKind;

/// Largest board or grid any game accepts
pub const MAX_BOARD_CELLS: u64 = 1 << 20;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" | "med" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier applied to speeds
    pub fn speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.25,
        }
    }

    /// Fraction of a board covered by mines
    pub fn mine_density(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.10,
            Difficulty::Normal => 0.15,
            Difficulty::Hard => 0.20,
        }
    }

    /// Starting lives
    pub fn lives(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }
}

/// Per-game tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed; every `init_game` reseeds from it
    pub seed: u64,
    pub difficulty: Difficulty,

    // === Boards ===
    /// (cols, rows) for board games (Snake, Tetris, 2048, brick wall, formation)
    pub board_size: (u32, u32),
    /// (cols, rows) for click grids (Minesweeper, pathfinding)
    pub grid_dimensions: (u32, u32),
    pub mine_count: u32,

    // === Motion ===
    /// Ball/word speed at spawn (pixels per second)
    pub initial_speed: f32,
    /// Speed added per paddle hit or level
    pub speed_increment: f32,
    pub max_speed: f32,
    /// Fixed tick interval for interval-driven games (ms)
    pub interval_ms: u32,

    // === Rules ===
    /// Points (or rounds, or tile value) that end the match in victory
    pub winning_score: u32,
    pub lives: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            difficulty: Difficulty::Normal,

            board_size: (20, 20),
            grid_dimensions: (9, 9),
            mine_count: 10,

            initial_speed: 300.0,
            speed_increment: 30.0,
            max_speed: 720.0,
            interval_ms: 100,

            winning_score: 5,
            lives: 3,
        }
    }
}

impl Settings {
    /// Defaults tuned for one game
    pub fn for_game(kind: GameKind) -> Self {
        let base = Self::default();
        match kind {
            GameKind::Pong => base,
            GameKind::Breakout => Self {
                board_size: (10, 5),
                speed_increment: 15.0,
                max_speed: 600.0,
                ..base
            },
            GameKind::Snake => Self {
                board_size: (20, 20),
                ..base
            },
            GameKind::Tetris => Self {
                board_size: (10, 20),
                ..base
            },
            GameKind::Asteroids => Self {
                initial_speed: 60.0,
                speed_increment: 10.0,
                max_speed: 160.0,
                ..base
            },
            GameKind::Invaders => Self {
                board_size: (11, 5),
                initial_speed: 20.0,
                speed_increment: 4.0,
                max_speed: 240.0,
                ..base
            },
            GameKind::Minesweeper => Self {
                grid_dimensions: (9, 9),
                mine_count: 10,
                ..base
            },
            GameKind::Merge2048 => Self {
                board_size: (4, 4),
                winning_score: 2048,
                ..base
            },
            GameKind::Pathfinding => Self {
                grid_dimensions: (20, 12),
                interval_ms: 16,
                ..base
            },
            GameKind::Typing => Self {
                initial_speed: 40.0,
                speed_increment: 8.0,
                max_speed: 160.0,
                ..base
            },
            GameKind::Simon => Self {
                winning_score: 20,
                interval_ms: 50,
                ..base
            },
        }
    }

    /// Parse settings from JSON, filling missing fields from defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply a difficulty preset (updates difficulty-dependent values)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        let rescale = preset.speed_scale() / self.difficulty.speed_scale();
        self.difficulty = preset;
        self.initial_speed *= rescale;
        self.max_speed *= rescale;
        self.lives = preset.lives();

        let (cols, rows) = self.grid_dimensions;
        let cells = (cols as u64 * rows as u64).min(u32::MAX as u64) as u32;
        let mines = (cells as f32 * preset.mine_density()).round() as u32;
        self.mine_count = mines.clamp(1, cells.saturating_sub(1).max(1));
    }

    /// Reject settings no game could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_board(self.board_size)?;
        let cells = check_board(self.grid_dimensions)?;
        if self.mine_count >= cells {
            return Err(ConfigError::TooManyMines {
                mines: self.mine_count,
                cells,
            });
        }
        if !(self.initial_speed > 0.0 && self.initial_speed <= self.max_speed) {
            return Err(ConfigError::SpeedRange {
                initial: self.initial_speed,
                max: self.max_speed,
            });
        }
        if self.speed_increment.is_nan() || self.speed_increment < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "speed_increment",
            });
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::NonPositive { field: "interval_ms" });
        }
        if self.winning_score == 0 {
            return Err(ConfigError::NonPositive {
                field: "winning_score",
            });
        }
        if self.lives == 0 {
            return Err(ConfigError::NonPositive { field: "lives" });
        }
        Ok(())
    }
}

/// Non-empty and within `MAX_BOARD_CELLS`; returns the cell count
fn check_board((cols, rows): (u32, u32)) -> Result<u32, ConfigError> {
    if cols == 0 || rows == 0 {
        return Err(ConfigError::EmptyBoard { cols, rows });
    }
    let cells = cols as u64 * rows as u64;
    if cells > MAX_BOARD_CELLS {
        return Err(ConfigError::BoardTooLarge {
            cols,
            rows,
            max: MAX_BOARD_CELLS,
        });
    }
    Ok(cells as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate_for_every_game() {
        for kind in GameKind::ALL {
            assert!(Settings::for_game(kind).validate().is_ok(), "{kind:?}");
        }
    }

    #[test]
    fn test_rejects_mines_filling_board() {
        let settings = Settings {
            grid_dimensions: (3, 3),
            mine_count: 9,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::TooManyMines { mines: 9, cells: 9 })
        ));
    }

    #[test]
    fn test_rejects_oversized_boards() {
        assert!(matches!(
            Settings::from_json(r#"{"grid_dimensions": [70000, 70000]}"#),
            Err(ConfigError::BoardTooLarge { cols: 70000, rows: 70000, .. })
        ));
        assert!(matches!(
            Settings::from_json(r#"{"board_size": [4294967295, 2]}"#),
            Err(ConfigError::BoardTooLarge { .. })
        ));

        let mut settings = Settings {
            grid_dimensions: (70000, 70000),
            ..Settings::default()
        };
        settings.apply_preset(Difficulty::Easy);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let settings = Settings {
            initial_speed: 900.0,
            max_speed: 100.0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::SpeedRange { .. })));
    }

    #[test]
    fn test_rejects_nan_increment() {
        let settings = Settings {
            speed_increment: f32::NAN,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"seed": 7, "mine_count": 3}"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.mine_count, 3);
        assert_eq!(settings.board_size, Settings::default().board_size);
    }

    #[test]
    fn test_from_json_reports_parse_error() {
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_apply_preset_scales_speeds() {
        let mut settings = Settings::default();
        settings.apply_preset(Difficulty::Hard);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!((settings.initial_speed - 375.0).abs() < 0.01);
        assert_eq!(settings.lives, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("brutal"), None);
    }
}

//! Shape helpers shared by several games

use glam::Vec2;

use super::{Align, Color, Frame};
use crate::polar_to_cartesian;
use crate::sim::collision::Rect;
use crate::sim::state::GamePhase;

/// Pixel placement of a row/column grid on a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub origin: Vec2,
    pub cell: f32,
    pub rows: u32,
    pub cols: u32,
}

impl GridLayout {
    /// Largest square cells that fit, centered on the surface
    pub fn fit(width: f32, height: f32, cols: u32, rows: u32) -> Self {
        let cols_f = cols.max(1) as f32;
        let rows_f = rows.max(1) as f32;
        let cell = (width / cols_f).min(height / rows_f).max(1.0).floor();
        let origin = Vec2::new(
            ((width - cell * cols_f) * 0.5).max(0.0),
            ((height - cell * rows_f) * 0.5).max(0.0),
        );
        Self {
            origin,
            cell,
            rows,
            cols,
        }
    }

    /// (row, col) under a pixel, if any
    pub fn cell_at(&self, p: Vec2) -> Option<(u32, u32)> {
        let local = (p - self.origin) / self.cell;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (col, row) = (local.x as u32, local.y as u32);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Pixel rectangle of a cell, shrunk by `inset` on every side
    pub fn cell_rect(&self, row: u32, col: u32, inset: f32) -> Rect {
        let min = self.origin + Vec2::new(col as f32, row as f32) * self.cell;
        let size = (self.cell - 2.0 * inset).max(0.0);
        Rect::new(min.x + inset, min.y + inset, size, size)
    }

    pub fn cell_center(&self, row: u32, col: u32) -> Vec2 {
        self.origin + (Vec2::new(col as f32, row as f32) + 0.5) * self.cell
    }
}

/// Tetromino / tile palette
pub fn palette(id: u8) -> Color {
    const COLORS: [Color; 8] = [
        Color(0x000000),
        Color(0xFF0D72),
        Color(0x0DC2FF),
        Color(0x0DFF72),
        Color(0xF538FF),
        Color(0xFF8E0D),
        Color(0xFFE138),
        Color(0x3877FF),
    ];
    COLORS[id as usize % COLORS.len()]
}

/// Triangle outline of a ship pointing along `angle`
pub fn ship_outline(pos: Vec2, angle: f32, size: f32) -> Vec<Vec2> {
    vec![
        pos + polar_to_cartesian(size, angle),
        pos + polar_to_cartesian(size * 0.8, angle + 2.5),
        pos + polar_to_cartesian(size * 0.8, angle - 2.5),
    ]
}

/// Jagged rock outline; `jag` holds per-vertex radius multipliers
pub fn rock_outline(pos: Vec2, radius: f32, jag: &[f32]) -> Vec<Vec2> {
    let n = jag.len().max(1) as f32;
    jag.iter()
        .enumerate()
        .map(|(i, j)| pos + polar_to_cartesian(radius * j, i as f32 / n * std::f32::consts::TAU))
        .collect()
}

/// Centered overlay text for non-playing phases
pub fn phase_banner(frame: &mut Frame, phase: GamePhase) {
    let label = match phase {
        GamePhase::Start => "PRESS START",
        GamePhase::Paused => "PAUSED",
        GamePhase::GameOver => "GAME OVER",
        GamePhase::Victory => "YOU WIN",
        GamePhase::Playing => return,
    };
    let center = Vec2::new(frame.width * 0.5, frame.height * 0.5);
    frame.text(center, label, 32.0, Color::WHITE, Align::Center);
}

/// Score/lives/level line along the top edge
pub fn hud(frame: &mut Frame, score: u64, lives: Option<u32>, level: Option<u32>) {
    let mut line = format!("Score {score}");
    if let Some(lives) = lives {
        line.push_str(&format!("   Lives {lives}"));
    }
    if let Some(level) = level {
        line.push_str(&format!("   Level {level}"));
    }
    frame.text(Vec2::new(8.0, 16.0), line, 14.0, Color::WHITE, Align::Left);
}

//! Render step output
//!
//! Games describe a frame as a flat list of draw commands; a host surface
//! (canvas, terminal, test recorder) rasterizes it. Rendering only reads game
//! state.

pub mod shapes;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::collision::Rect;

pub use shapes::GridLayout;

/// 0xRRGGBB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const GREY: Color = Color(0x808080);
    pub const DARK: Color = Color(0x1E1E2E);
    pub const RED: Color = Color(0xE74C3C);
    pub const GREEN: Color = Color(0x2ECC71);
    pub const BLUE: Color = Color(0x3498DB);
    pub const YELLOW: Color = Color(0xF1C40F);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear(Color),
    Rect {
        rect: Rect,
        color: Color,
        filled: bool,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        filled: bool,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    /// Closed outline through `points`
    Polygon { points: Vec<Vec2>, color: Color },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: Color,
        align: Align,
    },
}

/// One rendered frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Drop previous commands and start with a solid background
    pub fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Rect {
            rect,
            color,
            filled: true,
        });
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Rect {
            rect,
            color,
            filled: false,
        });
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            filled: true,
        });
    }

    pub fn ring(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            filled: false,
        });
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }

    pub fn polygon(&mut self, points: Vec<Vec2>, color: Color) {
        if points.len() >= 2 {
            self.commands.push(DrawCommand::Polygon { points, color });
        }
    }

    pub fn text(
        &mut self,
        pos: Vec2,
        text: impl Into<String>,
        size: f32,
        color: Color,
        align: Align,
    ) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.into(),
            size,
            color,
            align,
        });
    }

    /// All text drawn this frame (handy for headless inspection)
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Where frames end up
pub trait RenderSurface {
    /// Drawable size in pixels (width, height)
    fn size(&self) -> (f32, f32);
    fn present(&mut self, frame: &Frame);
}

/// Keeps the most recent frame; used by tests and the headless runner
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    last: Option<Frame>,
    presented: usize,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            last: None,
            presented: 0,
        }
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: &Frame) {
        self.last = Some(frame.clone());
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_commands() {
        let mut frame = Frame::new(100.0, 100.0);
        frame.circle(Vec2::ZERO, 3.0, Color::WHITE);
        frame.clear(Color::BLACK);
        assert_eq!(frame.commands, vec![DrawCommand::Clear(Color::BLACK)]);
    }

    #[test]
    fn test_degenerate_polygon_skipped() {
        let mut frame = Frame::new(10.0, 10.0);
        frame.polygon(vec![Vec2::ZERO], Color::WHITE);
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn test_rgb_packing() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56), Color(0x123456));
    }

    #[test]
    fn test_recording_surface_keeps_last() {
        let mut surface = RecordingSurface::new(50.0, 40.0);
        let mut frame = Frame::new(50.0, 40.0);
        frame.text(Vec2::ZERO, "hi", 12.0, Color::WHITE, Align::Left);
        surface.present(&frame);
        surface.present(&frame);
        assert_eq!(surface.presented(), 2);
        assert_eq!(surface.last_frame().unwrap().texts().collect::<Vec<_>>(), vec!["hi"]);
    }
}

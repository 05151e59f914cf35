//! Collision detection and response primitives
//!
//! Circles and axis-aligned boxes cover every game here. All functions are
//! pure and tolerate zero-size inputs without producing NaN.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A circle (ball, asteroid, bullet)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned rectangle, `min` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max())
    }
}

/// A body that moves by velocity integration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl MovingBody {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    /// Advance position by velocity. A non-finite velocity is treated as
    /// no movement so NaN never reaches the position.
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        if !self.vel.is_finite() {
            self.vel = Vec2::ZERO;
        }
        self.pos += self.vel * dt;
    }

    #[inline]
    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }
}

/// Component selector for axis reflections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// True iff the circles overlap (touching is not a hit)
#[inline]
pub fn circles_collide(a: &Circle, b: &Circle) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

/// True iff `p` lies inside `rect` (min edges inclusive, max edges exclusive)
#[inline]
pub fn point_in_rect(p: Vec2, rect: &Rect) -> bool {
    let max = rect.max();
    p.x >= rect.min.x && p.x < max.x && p.y >= rect.min.y && p.y < max.y
}

/// Strict AABB overlap
#[inline]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    let (a_max, b_max) = (a.max(), b.max());
    a.min.x < b_max.x && b.min.x < a_max.x && a.min.y < b_max.y && b.min.y < a_max.y
}

/// Circle vs rectangle using the closest point on the rectangle
#[inline]
pub fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let closest = rect.closest_point(circle.center);
    circle.center.distance_squared(closest) < circle.radius * circle.radius
}

/// Negate the velocity component along `axis` (wall bounce)
#[inline]
pub fn reflect_velocity(v: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::X => Vec2::new(-v.x, v.y),
        Axis::Y => Vec2::new(v.x, -v.y),
    }
}

#[inline]
pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    x.max(min).min(max)
}

/// Unit vector in the direction of `v`, or zero for a zero/non-finite vector
#[inline]
pub fn safe_direction(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > 0.0 && len.is_finite() {
        v / len
    } else {
        Vec2::ZERO
    }
}

/// Toroidal wrap into `[0, w) x [0, h)`
#[inline]
pub fn wrap_position(p: Vec2, w: f32, h: f32) -> Vec2 {
    if w <= 0.0 || h <= 0.0 {
        return p;
    }
    Vec2::new(wrap_axis(p.x, w), wrap_axis(p.y, h))
}

#[inline]
fn wrap_axis(x: f32, len: f32) -> f32 {
    let r = x.rem_euclid(len);
    // Tiny negatives round up to `len`
    if r >= len { 0.0 } else { r }
}

//! Paddle-ball physics shared by Pong and Breakout
//!
//! A paddle hit sets the outgoing angle from where the ball struck the face:
//! center sends it straight back, the edges deflect it up to 60 degrees.

use std::f32::consts::FRAC_PI_3;

use glam::Vec2;

use crate::sim::collision::{Axis, MovingBody, Rect, circle_rect_overlap, clamp, reflect_velocity};

/// Largest deflection from the paddle normal
pub const MAX_BOUNCE_ANGLE: f32 = FRAC_PI_3;
/// Gap left between ball and paddle face after a hit
pub const UNSTICK: f32 = 0.5;

/// Which way a paddle's hitting face points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
    Up,
}

impl Facing {
    pub fn normal(self) -> Vec2 {
        match self {
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
            Facing::Up => Vec2::NEG_Y,
        }
    }

    /// Direction the paddle slides along
    pub fn tangent(self) -> Vec2 {
        match self {
            Facing::Left | Facing::Right => Vec2::Y,
            Facing::Up => Vec2::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub rect: Rect,
    pub facing: Facing,
}

impl Paddle {
    pub fn new(x: f32, y: f32, w: f32, h: f32, facing: Facing) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            facing,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Half the paddle's length along its track
    pub fn half_extent(&self) -> f32 {
        self.rect.size.dot(self.facing.tangent()) * 0.5
    }

    /// Move along the track and keep the paddle inside `[0, limit]`
    pub fn slide(&mut self, delta: f32, limit: f32) {
        let step = if delta.is_finite() { delta } else { 0.0 };
        self.rect.min += self.facing.tangent() * step;
        self.clamp_to(limit);
    }

    /// Center the paddle on `target` along its track, clamped
    pub fn center_on(&mut self, target: f32, limit: f32) {
        let current = self.center().dot(self.facing.tangent());
        self.slide(target - current, limit);
    }

    pub fn clamp_to(&mut self, limit: f32) {
        match self.facing {
            Facing::Left | Facing::Right => {
                self.rect.min.y = clamp(self.rect.min.y, 0.0, (limit - self.rect.size.y).max(0.0));
            }
            Facing::Up => {
                self.rect.min.x = clamp(self.rect.min.x, 0.0, (limit - self.rect.size.x).max(0.0));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub body: MovingBody,
    pub speed: f32,
}

impl Ball {
    /// Ball at `pos` heading along `angle` (radians, 0 = +x) at `speed`
    pub fn launched(pos: Vec2, angle: f32, speed: f32, radius: f32) -> Self {
        Self {
            body: MovingBody::new(pos, Vec2::from_angle(angle) * speed, radius),
            speed,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }
}

/// Bounce the ball off `paddle` if it is striking the paddle's face.
///
/// Returns true on a hit. Speed grows by `increment`, capped at `max_speed`.
pub fn paddle_bounce(ball: &mut Ball, paddle: &Paddle, increment: f32, max_speed: f32) -> bool {
    let normal = paddle.facing.normal();
    let tangent = paddle.facing.tangent();

    // Only balls heading into the face count; this also stops re-hits
    if ball.body.vel.dot(normal) >= 0.0 {
        return false;
    }
    if !circle_rect_overlap(&ball.body.circle(), &paddle.rect) {
        return false;
    }
    // Leading edge band: ball center must be on the face side of the paddle center
    if (ball.body.pos - paddle.center()).dot(normal) < 0.0 {
        return false;
    }

    let half = paddle.half_extent();
    let offset = (ball.body.pos - paddle.center()).dot(tangent);
    let normalized = if half > 0.0 { clamp(offset / half, -1.0, 1.0) } else { 0.0 };
    let angle = normalized * MAX_BOUNCE_ANGLE;

    ball.speed = (ball.speed + increment).min(max_speed);
    ball.body.vel = normal * (ball.speed * angle.cos()) + tangent * (ball.speed * angle.sin());

    let r = ball.body.radius + UNSTICK;
    match paddle.facing {
        Facing::Right => ball.body.pos.x = paddle.rect.max().x + r,
        Facing::Left => ball.body.pos.x = paddle.rect.min.x - r,
        Facing::Up => ball.body.pos.y = paddle.rect.min.y - r,
    }
    true
}

/// Bounce off the top and bottom edges. Returns true on a bounce.
pub fn bounce_top_bottom(body: &mut MovingBody, height: f32) -> bool {
    if body.pos.y - body.radius < 0.0 && body.vel.y < 0.0 {
        body.pos.y = body.radius;
        body.vel = reflect_velocity(body.vel, Axis::Y);
        return true;
    }
    if body.pos.y + body.radius > height && body.vel.y > 0.0 {
        body.pos.y = height - body.radius;
        body.vel = reflect_velocity(body.vel, Axis::Y);
        return true;
    }
    false
}

/// Bounce off the left and right edges. Returns true on a bounce.
pub fn bounce_sides(body: &mut MovingBody, width: f32) -> bool {
    if body.pos.x - body.radius < 0.0 && body.vel.x < 0.0 {
        body.pos.x = body.radius;
        body.vel = reflect_velocity(body.vel, Axis::X);
        return true;
    }
    if body.pos.x + body.radius > width && body.vel.x > 0.0 {
        body.pos.x = width - body.radius;
        body.vel = reflect_velocity(body.vel, Axis::X);
        return true;
    }
    false
}

/// Bounce off the top edge only (Breakout). Returns true on a bounce.
pub fn bounce_top(body: &mut MovingBody) -> bool {
    if body.pos.y - body.radius < 0.0 && body.vel.y < 0.0 {
        body.pos.y = body.radius;
        body.vel = reflect_velocity(body.vel, Axis::Y);
        return true;
    }
    false
}

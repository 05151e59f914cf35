//! Simulation core shared by every game
//!
//! Games must stay deterministic and render-free:
//! - Seeded RNG only
//! - Time only through `dt`
//! - Input only through `TickInput`
//! - No platform dependencies

pub mod collision;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::{
    Axis, Circle, MovingBody, Rect, circle_rect_overlap, circles_collide, clamp, point_in_rect,
    rects_overlap, reflect_velocity, safe_direction, wrap_position,
};
pub use scheduler::{FrameHandle, ManualScheduler, Scheduler, Wake};
pub use state::{
    Command, GamePhase, HeldControls, Progress, RngState, Snapshot, Spin, Stats, TickInput,
};
pub use tick::{Cadence, Game, GameLoop};
pub use timers::{TimerId, TimerQueue};

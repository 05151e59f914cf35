//! Continuation scheduling
//!
//! The host event loop (animation frames, interval timers) sits behind the
//! `Scheduler` trait. `ManualScheduler` is a virtual clock used by tests and
//! the headless runner.

use std::cell::RefCell;
use std::rc::Rc;

/// Identifies one scheduled continuation. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// When a continuation should fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Next display frame
    NextFrame,
    /// After a fixed delay in milliseconds
    After(u32),
}

pub trait Scheduler {
    fn schedule(&mut self, wake: Wake) -> FrameHandle;
    fn cancel(&mut self, handle: FrameHandle);
}

/// One host scheduler shared by several mounted games
impl<S: Scheduler> Scheduler for Rc<RefCell<S>> {
    fn schedule(&mut self, wake: Wake) -> FrameHandle {
        self.borrow_mut().schedule(wake)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.borrow_mut().cancel(handle);
    }
}

/// Virtual-clock scheduler
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now_ms: f64,
    frame_ms: f64,
    next_id: u64,
    queue: Vec<(FrameHandle, f64)>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(1000.0 / 60.0)
    }
}

impl ManualScheduler {
    /// `frame_ms` is the simulated display refresh period
    pub fn new(frame_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            frame_ms,
            next_id: 1,
            queue: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Outstanding continuations
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.queue.iter().any(|(h, _)| *h == handle)
    }

    /// Due time of the earliest continuation
    pub fn next_due(&self) -> Option<f64> {
        self.queue.iter().map(|(_, due)| *due).min_by(f64::total_cmp)
    }

    /// Pop the earliest continuation, advancing the clock to its due time
    pub fn fire_next(&mut self) -> Option<(FrameHandle, f64)> {
        let idx = self
            .queue
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.1.total_cmp(&b.1.1).then(a.1.0.cmp(&b.1.0)))
            .map(|(i, _)| i)?;
        let (handle, due) = self.queue.remove(idx);
        self.set_now(due);
        Some((handle, self.now_ms))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, wake: Wake) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        let delay = match wake {
            Wake::NextFrame => self.frame_ms,
            Wake::After(ms) => ms as f64,
        };
        self.queue.push((handle, self.now_ms + delay));
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.queue.retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_unique() {
        let mut sched = ManualScheduler::default();
        let a = sched.schedule(Wake::NextFrame);
        let b = sched.schedule(Wake::NextFrame);
        assert_ne!(a, b);
        assert_eq!(sched.pending(), 2);
    }

    #[test]
    fn test_fire_in_due_order() {
        let mut sched = ManualScheduler::new(16.0);
        let late = sched.schedule(Wake::After(100));
        let early = sched.schedule(Wake::NextFrame);

        assert_eq!(sched.fire_next(), Some((early, 16.0)));
        assert_eq!(sched.fire_next(), Some((late, 100.0)));
        assert_eq!(sched.fire_next(), None);
        assert_eq!(sched.now(), 100.0);
    }

    #[test]
    fn test_cancel_removes() {
        let mut sched = ManualScheduler::default();
        let h = sched.schedule(Wake::After(10));
        sched.cancel(h);
        assert!(!sched.is_pending(h));
        assert_eq!(sched.fire_next(), None);
    }
}

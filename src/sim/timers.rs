//! Cancelable in-game timers
//!
//! Timers only advance when their owning game is stepped, so a stopped loop
//! can never fire one. `clear` drops everything on reset.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<E> {
    id: TimerId,
    remaining_ms: f32,
    event: E,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay_ms: f32, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            remaining_ms: delay_ms.max(0.0),
            event,
        });
        id
    }

    /// Returns false if the timer already fired or was canceled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Advance time and return every event that came due, earliest first
    pub fn advance(&mut self, dt_ms: f32) -> Vec<E> {
        for p in &mut self.pending {
            p.remaining_ms -= dt_ms;
        }
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.remaining_ms <= 0.0);
        self.pending = rest;
        // Earlier deadline = more negative remaining; ties keep schedule order
        due.sort_by(|a, b| {
            a.remaining_ms
                .total_cmp(&b.remaining_ms)
                .then(a.id.0.cmp(&b.id.0))
        });
        due.into_iter().map(|p| p.event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(30.0, "b");
        timers.schedule(10.0, "a");
        timers.schedule(100.0, "c");

        assert!(timers.advance(5.0).is_empty());
        assert_eq!(timers.advance(30.0), vec!["a", "b"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.advance(100.0), vec!["c"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(10.0, 1);
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.advance(50.0).is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut timers = TimerQueue::new();
        timers.schedule(1.0, ());
        timers.schedule(2.0, ());
        timers.clear();
        assert!(timers.advance(10.0).is_empty());
    }
}

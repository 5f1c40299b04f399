//! Timers for deferred commits.
//!
//! The reconciler itself never sleeps or spawns; deferred work is expressed
//! as timeouts on a [`Scheduler`] which the embedding event loop polls.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Identifier returned by [`Scheduler::schedule_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeoutId(u64);

pub trait Scheduler {
    /// Arrange for `id` to be reported by [`Scheduler::take_expired`] once
    /// `delay` has elapsed.
    fn schedule_timeout(&mut self, delay: Duration) -> TimeoutId;

    /// Forget a timeout. Unknown or already fired ids are ignored.
    fn cancel_timeout(&mut self, id: TimeoutId);

    /// Remove and return every timeout due at `now`, earliest first.
    fn take_expired(&mut self, now: Instant) -> Vec<TimeoutId>;

    /// When the earliest pending timeout is due.
    fn next_deadline(&self) -> Option<Instant>;
}

/// Monotonic-clock timer queue.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(Instant, TimeoutId), ()>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn schedule_timeout(&mut self, delay: Duration) -> TimeoutId {
        let id = TimeoutId(self.next_id);
        self.next_id += 1;
        self.pending.insert((Instant::now() + delay, id), ());
        id
    }

    fn cancel_timeout(&mut self, id: TimeoutId) {
        self.pending.retain(|(_, pending), _| *pending != id);
    }

    fn take_expired(&mut self, now: Instant) -> Vec<TimeoutId> {
        let due: Vec<_> = self
            .pending
            .keys()
            .take_while(|(deadline, _)| *deadline <= now)
            .copied()
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let late = timers.schedule_timeout(Duration::from_millis(20));
        let early = timers.schedule_timeout(Duration::ZERO);

        let later = Instant::now() + Duration::from_secs(1);
        assert_eq!(timers.take_expired(later), vec![early, late]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_not_yet_due_stays_pending() {
        let mut timers = TimerQueue::new();
        timers.schedule_timeout(Duration::from_secs(3600));
        assert!(timers.take_expired(Instant::now()).is_empty());
        assert_eq!(timers.len(), 1);
        assert!(timers.next_deadline().is_some());
    }

    #[test]
    fn test_cancel_timeout() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_timeout(Duration::ZERO);
        timers.cancel_timeout(id);
        timers.cancel_timeout(id);
        assert!(timers
            .take_expired(Instant::now() + Duration::from_secs(1))
            .is_empty());
    }
}

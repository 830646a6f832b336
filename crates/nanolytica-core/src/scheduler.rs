//! Deferred callbacks.
//!
//! The tracker schedules at most one kind of delayed work (the post-swap
//! view start). There is no cancellation: a page torn down before the delay
//! elapses simply never runs the task.

use std::time::Duration;

use crate::trigger::DeferredTask;

pub trait Scheduler {
    /// Run `task` once `delay` has passed, measured from `now_ms`.
    fn defer(&mut self, now_ms: i64, delay: Duration, task: DeferredTask);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub due_ms: i64,
    pub task: DeferredTask,
}

/// Virtual-time queue. The owner pulls due tasks and feeds them back to the
/// tracker.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    pending: Vec<Pending>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, if anything is pending.
    pub fn next_due_ms(&self) -> Option<i64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    /// Remove and return tasks due at or before `now_ms`, in due order.
    /// Ties keep scheduling order.
    pub fn take_due(&mut self, now_ms: i64) -> Vec<Pending> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now_ms);
        self.pending = rest;
        due.sort_by_key(|p| p.due_ms);
        due
    }

    /// Drop everything pending; returns how many tasks were discarded.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }
}

impl Scheduler for DeferredQueue {
    fn defer(&mut self, now_ms: i64, delay: Duration, task: DeferredTask) {
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        self.pending.push(Pending {
            due_ms: now_ms.saturating_add(delay_ms),
            task,
        });
    }
}

//! # Tick Scheduler
//!
//! Delayed work tagged with the tick number it is due on.
//!
//! Tasks due on the same tick run in the order they were scheduled.

use std::collections::BTreeMap;

/// Handle to a scheduled task, usable for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    tick: u64,
    seq: u64,
}

impl TaskId {
    /// Tick the task is due on.
    #[must_use]
    pub const fn due_tick(self) -> u64 {
        self.tick
    }
}

/// Queue of tasks keyed by due tick.
#[derive(Debug)]
pub struct TickScheduler<T> {
    queue: BTreeMap<(u64, u64), T>,
    next_seq: u64,
}

impl<T> TickScheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Queues `task` to become due on `tick`.
    pub fn schedule(&mut self, tick: u64, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((tick, seq), task);
        TaskId { tick, seq }
    }

    /// Removes a task that has not run yet.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.queue.remove(&(id.tick, id.seq)).is_some()
    }

    /// Removes and returns every task due on or before `now`, in run order.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let later = match now.checked_add(1) {
            Some(next) => self.queue.split_off(&(next, 0)),
            None => BTreeMap::new(),
        };
        std::mem::replace(&mut self.queue, later).into_values().collect()
    }

    /// Earliest due tick among pending tasks.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(tick, _)| *tick)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

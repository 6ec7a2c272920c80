//! Virtual-time task scheduler shared by both engines.
//!
//! The scheduler owns a clock that only moves when the owning engine asks it
//! to. Tasks are plain values (usually an enum naming what to do and which
//! combat or map epoch it belongs to), so nothing captures stale state.
//!
//! Ordering: earliest due time first, ties in scheduling order. Engines pull
//! tasks one at a time with [`TickScheduler::poll`], so a task that schedules
//! another task inside the same advance window still runs in time order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// A queued task with its due time.
#[derive(Debug, Clone)]
struct Entry<T> {
    due: Duration,
    id: TaskId,
    period: Option<Duration>,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then_with(|| self.id.cmp(&other.id))
    }
}

/// Discrete-event scheduler over a virtual clock.
#[derive(Debug, Clone)]
pub struct TickScheduler<T> {
    now: Duration,
    queue: BinaryHeap<Reverse<Entry<T>>>,
    next_id: u64,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickScheduler<T> {
    /// Create an empty scheduler with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            queue: BinaryHeap::new(),
            next_id: 0,
        }
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn push(&mut self, due: Duration, period: Option<Duration>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse(Entry {
            due,
            id,
            period,
            task,
        }));
        id
    }

    /// Run `task` once, `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        self.push(self.now + delay, None, task)
    }

    /// Run `task` every `period`, first after one period.
    ///
    /// A zero period would never let the clock advance; it is bumped to one
    /// millisecond.
    pub fn schedule_every(&mut self, period: Duration, task: T) -> TaskId {
        let period = period.max(Duration::from_millis(1));
        self.push(self.now + period, Some(period), task)
    }

    /// Cancel a task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| entry.id != id);
        let removed = self.queue.len() != before;
        if removed {
            tracing::debug!(task = id.0, "cancelled scheduled task");
        }
        removed
    }

    /// Whether the task is still queued.
    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.queue.iter().any(|Reverse(entry)| entry.id == id)
    }

    /// Move the clock forward to `until` without running anything.
    ///
    /// The clock never moves backwards.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl<T: Clone> TickScheduler<T> {
    /// Pop the earliest task due at or before `until`.
    ///
    /// The clock moves to the task's due time. Repeating tasks are re-armed
    /// one period later under the same [`TaskId`].
    pub fn poll(&mut self, until: Duration) -> Option<T> {
        let due = self.queue.peek().map(|Reverse(entry)| entry.due)?;
        if due > until {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        if let Some(period) = entry.period {
            self.queue.push(Reverse(Entry {
                due: entry.due + period,
                id: entry.id,
                period: Some(period),
                task: entry.task.clone(),
            }));
        }
        Some(entry.task)
    }
}

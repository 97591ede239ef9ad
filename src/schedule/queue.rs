//! Deterministic turn queue with a virtual clock.
//!
//! The queue holds ready tasks in strict FIFO order and delayed tasks in a
//! min-heap keyed by (deadline, insertion sequence). Nothing runs on its
//! own: an embedder (usually a test) drives the queue with
//! [`run_until_idle`](TurnQueue::run_until_idle) and
//! [`advance`](TurnQueue::advance).
//!
//! # Determinism Guarantees
//!
//! - Ready tasks run in enqueue order, one at a time
//! - A task enqueued from inside a running task joins the back of the queue
//!   and runs in the same drain, after everything already queued
//! - Timers with the same deadline fire in insertion order
//! - Time is virtual: it moves only through [`advance`](TurnQueue::advance),
//!   never from the wall clock

use super::{Schedule, Task};
use crate::tracing_compat::trace;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A delayed task waiting for the virtual clock.
struct TimerEntry {
    /// Absolute virtual deadline.
    deadline: Duration,
    /// Insertion sequence, the tie-breaker for equal deadlines.
    seq: u64,
    task: Task,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap ordering: earliest deadline first, then lowest sequence
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct QueueInner {
    ready: VecDeque<Task>,
    timers: BinaryHeap<TimerEntry>,
    /// Current virtual time.
    now: Duration,
    next_seq: u64,
}

/// Deterministic FIFO task queue with virtual time.
///
/// Implements [`Schedule`]; obtain the capability to hand to deferred-value
/// constructors via [`handle`](Self::handle).
///
/// # Example
///
/// ```
/// use deferred::TurnQueue;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let queue = Arc::new(TurnQueue::new());
/// let sched = queue.handle();
///
/// sched.schedule(Box::new(|| {}));
/// assert_eq!(queue.run_until_idle(), 1);
///
/// sched.delay(Box::new(|| {}), Duration::from_millis(5));
/// assert_eq!(queue.advance(Duration::from_millis(5)), 1);
/// ```
pub struct TurnQueue {
    inner: Mutex<QueueInner>,
}

impl Default for TurnQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnQueue {
    /// Creates an empty queue with the virtual clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ready: VecDeque::new(),
                timers: BinaryHeap::new(),
                now: Duration::ZERO,
                next_seq: 0,
            }),
        }
    }

    /// Returns the scheduling capability backed by this queue.
    #[must_use]
    pub fn handle(self: &Arc<Self>) -> super::SchedulerHandle {
        let handle: super::SchedulerHandle = Arc::<Self>::clone(self);
        handle
    }

    /// Runs ready tasks until the ready queue is empty, including tasks
    /// enqueued by the tasks themselves. Returns the number of tasks run.
    ///
    /// The lock is not held while a task runs, so tasks may re-enter
    /// [`Schedule::schedule`] freely.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.lock().ready.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Advances the virtual clock by `by`, firing due timers.
    ///
    /// Timers fire in (deadline, insertion) order. After each timer fires,
    /// the ready queue is drained before the clock moves again, so follow-up
    /// work scheduled by a timer runs in its own turn at that deadline.
    /// Returns the total number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let mut ran = self.run_until_idle();
        let target = self.lock().now + by;
        loop {
            let due = {
                let mut inner = self.lock();
                match inner.timers.pop() {
                    Some(entry) if entry.deadline <= target => {
                        trace!(deadline_us = entry.deadline.as_micros() as u64, "timer due");
                        inner.now = entry.deadline;
                        Some(entry.task)
                    }
                    Some(entry) => {
                        inner.timers.push(entry);
                        inner.now = target;
                        None
                    }
                    None => {
                        inner.now = target;
                        None
                    }
                }
            };
            match due {
                Some(task) => {
                    task();
                    ran += 1;
                    ran += self.run_until_idle();
                }
                None => break,
            }
        }
        ran
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Returns true when no ready tasks and no timers remain.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let inner = self.lock();
        inner.ready.is_empty() && inner.timers.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().expect("queue lock poisoned")
    }
}

impl Schedule for TurnQueue {
    fn schedule(&self, task: Task) {
        self.lock().ready.push_back(task);
    }

    fn delay(&self, task: Task, after: Duration) {
        let mut inner = self.lock();
        let deadline = inner.now + after;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.timers.push(TimerEntry {
            deadline,
            seq,
            task,
        });
    }
}

//! The external scheduling contract and the reference turn queue.
//!
//! The deferred-value core never runs a reaction itself; it hands every
//! dispatch to a [`Schedule`] implementation. The contract is deliberately
//! small:
//!
//! - [`Schedule::schedule`] invokes the task at a strictly later point than
//!   the enqueuing call, preserving FIFO order among tasks enqueued during
//!   the same turn
//! - [`Schedule::delay`] invokes the task once the given duration has
//!   elapsed, measured from the enqueuing call
//!
//! [`TurnQueue`] is the crate's deterministic implementation, driven
//! manually with a virtual clock. Hosts that already own an event loop
//! implement [`Schedule`] over it instead; the queue's internals (timer
//! wheel, reactor) are their business, only the FIFO/later-turn contract is
//! ours.

mod queue;

pub use queue::TurnQueue;

use std::sync::Arc;
use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// The queueing capability the deferred-value core depends on.
pub trait Schedule: Send + Sync {
    /// Enqueues `task` to run at a strictly later point.
    ///
    /// Tasks enqueued during the same turn must run in enqueue order. The
    /// task must never be invoked synchronously from inside this call.
    fn schedule(&self, task: Task);

    /// Enqueues `task` to run once `after` has elapsed from this call.
    fn delay(&self, task: Task, after: Duration);
}

/// Shared handle to a scheduler, passed to every deferred-value constructor.
pub type SchedulerHandle = Arc<dyn Schedule>;

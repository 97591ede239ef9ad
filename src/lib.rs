//! Deferred: settle-once deferred values with queued reaction dispatch.
//!
//! # Overview
//!
//! A [`Deferred`] starts empty and is settled exactly once, either fulfilled
//! with a value or rejected with a reason. Consumers attach reactions with
//! [`Deferred::then`]; every reaction produces a new deferred value, so
//! reactions compose into chains. A reaction that returns another deferred
//! value is flattened: the outer chain adopts the inner value's eventual
//! outcome instead of wrapping it.
//!
//! # Core Guarantees
//!
//! - **Settle-once**: after the first settlement, every later settlement call
//!   of either kind is a silent no-op
//! - **Asynchronous delivery**: reactions never run in the same turn as the
//!   call that settled or attached them; delivery always goes through the
//!   scheduler
//! - **Registration order**: reactions attached before settlement fire in
//!   attachment order
//! - **Error transparency**: a rejection skips chain links that install no
//!   rejection handler and surfaces at the first link that does
//!
//! # Scheduling
//!
//! The crate performs no scheduling of its own. Every constructor takes a
//! [`SchedulerHandle`], the capability through which reaction dispatch and
//! the delayed factories run. [`TurnQueue`] is the deterministic reference
//! implementation: a strict-FIFO task queue with a virtual clock, driven
//! manually via [`TurnQueue::run_until_idle`] and [`TurnQueue::advance`].
//! Hosts with an event loop of their own implement [`Schedule`] instead.
//!
//! # Module Structure
//!
//! - [`deferred`]: the settle-once state machine, chaining, and factories
//! - [`eventual`]: the plain-value / deferred-value discriminated wrapper
//! - [`combinator`]: `all` and `race` over collections of eventual values
//! - [`schedule`]: the scheduler contract and the deterministic turn queue
//!
//! # Example
//!
//! ```
//! use deferred::{Deferred, Eventual, TurnQueue};
//! use std::sync::Arc;
//!
//! let queue = Arc::new(TurnQueue::new());
//! let sched = queue.handle();
//!
//! let chained = Deferred::<i32, String>::fulfilled(&sched, 2)
//!     .then(
//!         |value| Ok(Eventual::Ready(value * 10)),
//!         |reason| Err(reason),
//!     );
//!
//! queue.run_until_idle();
//! assert_eq!(chained.try_result(), Some(Ok(20)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod combinator;
pub mod deferred;
pub mod eventual;
pub mod schedule;
pub mod tracing_compat;

pub use combinator::{all, race};
pub use deferred::{Deferred, Settler};
pub use eventual::Eventual;
pub use schedule::{Schedule, SchedulerHandle, Task, TurnQueue};

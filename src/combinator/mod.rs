//! Aggregate combinators over collections of eventual values.
//!
//! Both combinators normalize every input through the `resolve` factory, so
//! plain values behave as already fulfilled, and both are built entirely on
//! [`then`](crate::Deferred::then) plus a shared [`Settler`](crate::Settler).
//! They add no state-machine logic of their own; the settle-once guard on
//! the output does all the arbitration.
//!
//! - [`all`]: fulfills with every result aligned by input index, or rejects
//!   with the first rejection reason
//! - [`race`]: settles identically to whichever input settles first, by
//!   either outcome

mod all;
mod race;

pub use all::all;
pub use race::race;

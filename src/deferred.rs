//! Settle-once deferred value: state machine, chaining, and factories.
//!
//! A [`Deferred`] moves through exactly one transition:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      SETTLE-ONCE LIFECYCLE                       │
//! │                                                                  │
//! │                  ┌── fulfill(value) ──► Fulfilled(value)         │
//! │   Pending ───────┤                                               │
//! │   (reactions)    └── reject(reason) ──► Rejected(reason)         │
//! │                                                                  │
//! │   Any later fulfill/reject call of either kind: silent no-op.    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While pending, [`Deferred::then`] appends a reaction pair to the value's
//! reaction list. Settlement drains the list exactly once and schedules a
//! single dispatch task that runs every reaction's matching side in
//! registration order. A reaction attached after settlement schedules its
//! own dispatch task immediately.
//!
//! # Delivery Is Never Synchronous
//!
//! Reactions always run through the [`Schedule`](crate::schedule::Schedule)
//! capability, in a strictly later turn than the call that settled or
//! attached them. Observable ordering therefore does not depend on whether a
//! reaction was attached before or after settlement.
//!
//! # Producer Side
//!
//! The producer holds a [`Settler`], the one handle that can settle the
//! value. [`Deferred::pending`] returns the (consumer, producer) pair;
//! [`Deferred::new`] runs a producer closure synchronously and converts its
//! `Err` return into a rejection, unless the producer already settled.

use crate::eventual::Eventual;
use crate::schedule::SchedulerHandle;
use crate::tracing_compat::trace;
use core::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A reaction pair registered while the value was pending.
///
/// Exactly one side runs, chosen by the settlement outcome; the other side
/// is dropped.
struct Reaction<T, E> {
    on_fulfilled: Box<dyn FnOnce(T) + Send>,
    on_rejected: Box<dyn FnOnce(E) + Send>,
}

/// The three-state lifecycle. The result lives inside the settled variants,
/// so "result while pending" is unrepresentable.
enum State<T, E> {
    /// Not yet settled; holds the reactions registered so far.
    Pending { reactions: Vec<Reaction<T, E>> },
    /// Settled with a success value.
    Fulfilled(T),
    /// Settled with a failure reason.
    Rejected(E),
}

impl<T, E> State<T, E> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
}

/// What `subscribe` found under the lock. Scheduling happens after the lock
/// is released.
enum Attach<T, E> {
    Queued,
    AlreadyFulfilled(T, Box<dyn FnOnce(T) + Send>),
    AlreadyRejected(E, Box<dyn FnOnce(E) + Send>),
}

/// A settle-once deferred value.
///
/// `Deferred` is a cheap clonable handle; clones observe the same underlying
/// cell. It is settled through a [`Settler`] and observed through
/// [`then`](Self::then) / [`catch`](Self::catch) chains or the non-blocking
/// [`try_result`](Self::try_result).
///
/// # Type Parameters
/// * `T` - The fulfillment value type
/// * `E` - The rejection reason type (the crate's single failure channel)
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
    sched: SchedulerHandle,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sched: Arc::clone(&self.sched),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock().expect("state lock poisoned");
        f.debug_struct("Deferred").field("state", &state.name()).finish()
    }
}

/// The producer handle for a [`Deferred`].
///
/// Both settlement methods take `&self` and are idempotent: the first call
/// wins, every later call of either kind is a silent no-op. The handle is
/// clonable so a producer can hand settlement capability to several
/// completion paths and let the settle-once guard arbitrate.
pub struct Settler<T, E> {
    target: Deferred<T, E>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler").field("target", &self.target).finish()
    }
}

impl<T, E> Settler<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Fulfills the target with `value`. No-op if already settled.
    pub fn fulfill(&self, value: T) {
        self.target.settle_fulfill(value);
    }

    /// Rejects the target with `reason`. No-op if already settled.
    pub fn reject(&self, reason: E) {
        self.target.settle_reject(reason);
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn unsettled(sched: &SchedulerHandle) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending {
                    reactions: Vec::new(),
                }),
            }),
            sched: Arc::clone(sched),
        }
    }

    /// Creates a pending value and the [`Settler`] that settles it.
    ///
    /// This is the producer/consumer pair constructor; [`Deferred::new`] and
    /// every factory below are built on it.
    #[must_use]
    pub fn pending(sched: &SchedulerHandle) -> (Self, Settler<T, E>) {
        let deferred = Self::unsettled(sched);
        let settler = Settler {
            target: deferred.clone(),
        };
        (deferred, settler)
    }

    /// Creates a deferred value and runs `producer` synchronously with its
    /// [`Settler`].
    ///
    /// A producer that returns `Err` without having settled yields a
    /// rejected value carrying that reason. A producer that settles first
    /// and then returns `Err` keeps its settlement; the late reason is
    /// absorbed by the settle-once guard.
    pub fn new<P>(sched: &SchedulerHandle, producer: P) -> Self
    where
        P: FnOnce(Settler<T, E>) -> Result<(), E>,
    {
        let (deferred, settler) = Self::pending(sched);
        if let Err(reason) = producer(settler.clone()) {
            settler.reject(reason);
        }
        deferred
    }

    /// Returns a deferred value that adopts `eventual`.
    ///
    /// `Ready(value)` fulfills immediately. `Deferred(inner)` mirrors the
    /// inner value's eventual settlement, one level deep: the result adopts
    /// `inner`'s outcome rather than fulfilling with `inner` itself.
    #[must_use]
    pub fn resolve(sched: &SchedulerHandle, eventual: Eventual<T, E>) -> Self {
        match eventual {
            Eventual::Ready(value) => Self::fulfilled(sched, value),
            Eventual::Deferred(inner) => {
                let (deferred, settler) = Self::pending(sched);
                let reject = settler.clone();
                inner.subscribe(
                    Box::new(move |value| settler.fulfill(value)),
                    Box::new(move |reason| reject.reject(reason)),
                );
                deferred
            }
        }
    }

    /// Returns a deferred value already fulfilled with `value`.
    #[must_use]
    pub fn fulfilled(sched: &SchedulerHandle, value: T) -> Self {
        let (deferred, settler) = Self::pending(sched);
        settler.fulfill(value);
        deferred
    }

    /// Returns a deferred value already rejected with `reason`.
    ///
    /// No adoption happens on this path: the reason is stored as-is.
    #[must_use]
    pub fn rejected(sched: &SchedulerHandle, reason: E) -> Self {
        let (deferred, settler) = Self::pending(sched);
        settler.reject(reason);
        deferred
    }

    /// Like [`resolve`](Self::resolve), but the whole resolve decision
    /// (including adoption of a deferred input) is deferred until `delay`
    /// has elapsed, measured from this call.
    ///
    /// Only the settlement decision is delayed; if the input is a deferred
    /// value, whatever computation backs it keeps running.
    #[must_use]
    pub fn resolve_after(
        sched: &SchedulerHandle,
        eventual: Eventual<T, E>,
        delay: Duration,
    ) -> Self {
        let (deferred, settler) = Self::pending(sched);
        sched.delay(
            Box::new(move || match eventual {
                Eventual::Ready(value) => settler.fulfill(value),
                Eventual::Deferred(inner) => {
                    let reject = settler.clone();
                    inner.subscribe(
                        Box::new(move |value| settler.fulfill(value)),
                        Box::new(move |reason| reject.reject(reason)),
                    );
                }
            }),
            delay,
        );
        deferred
    }

    /// Returns a deferred value rejected with `reason` once `delay` has
    /// elapsed. No adoption, mirroring [`rejected`](Self::rejected).
    #[must_use]
    pub fn reject_after(sched: &SchedulerHandle, reason: E, delay: Duration) -> Self {
        let (deferred, settler) = Self::pending(sched);
        sched.delay(Box::new(move || settler.reject(reason)), delay);
        deferred
    }

    /// Attaches a reaction pair and returns the deferred value it settles.
    ///
    /// Exactly one handler eventually runs, chosen by this value's
    /// settlement outcome, and its return settles the output:
    ///
    /// - `Ok(Eventual::Ready(value))` fulfills the output with `value`
    /// - `Ok(Eventual::Deferred(inner))` makes the output mirror `inner`'s
    ///   eventual outcome, recursively, with no depth limit
    /// - `Err(reason)` rejects the output (the typed rendition of a handler
    ///   that throws)
    ///
    /// The handler never runs in the turn that calls `then`, even when this
    /// value is already settled.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Eventual<U, E>, E> + Send + 'static,
        R: FnOnce(E) -> Result<Eventual<U, E>, E> + Send + 'static,
    {
        let output = Deferred::unsettled(&self.sched);
        let fulfill_out = output.clone();
        let reject_out = output.clone();
        self.subscribe(
            Box::new(move |value| fulfill_out.adopt(on_fulfilled(value))),
            Box::new(move |reason| reject_out.adopt(on_rejected(reason))),
        );
        output
    }

    /// [`then`](Self::then) with the default rejection side: the reason is
    /// re-raised untouched, so rejections propagate past this link. This is
    /// the error-transparency mechanism.
    pub fn then_fulfilled<U, F>(&self, on_fulfilled: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Eventual<U, E>, E> + Send + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// [`then`](Self::then) with the default fulfillment side: the value
    /// passes through unchanged, so only rejections reach `on_rejected`.
    pub fn catch<R>(&self, on_rejected: R) -> Deferred<T, E>
    where
        R: FnOnce(E) -> Result<Eventual<T, E>, E> + Send + 'static,
    {
        self.then(|value| Ok(Eventual::Ready(value)), on_rejected)
    }

    /// Returns true while the value has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(
            &*self.shared.state.lock().expect("state lock poisoned"),
            State::Pending { .. }
        )
    }

    /// Returns true once the value has settled, either way.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Returns a clone of the settled result, or `None` while pending.
    ///
    /// This is an inspection hook for producers and tests; consumers
    /// normally observe settlement through [`then`](Self::then).
    #[must_use]
    pub fn try_result(&self) -> Option<Result<T, E>> {
        match &*self.shared.state.lock().expect("state lock poisoned") {
            State::Pending { .. } => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }

    /// The settlement transition, fulfillment side.
    ///
    /// Check-and-transition happens under a single lock acquisition, so the
    /// settle-once guard holds under real threads. If any reactions were
    /// registered, one dispatch task is scheduled that runs them all in
    /// registration order, each with its own clone of the value.
    fn settle_fulfill(&self, value: T) {
        let reactions = {
            let mut state = self.shared.state.lock().expect("state lock poisoned");
            let State::Pending { reactions } = &mut *state else {
                trace!("fulfill after settlement ignored");
                return;
            };
            let reactions = std::mem::take(reactions);
            if reactions.is_empty() {
                *state = State::Fulfilled(value);
                return;
            }
            *state = State::Fulfilled(value.clone());
            reactions
        };
        trace!(reactions = reactions.len(), "fulfilled, scheduling dispatch");
        self.sched.schedule(Box::new(move || {
            for reaction in reactions {
                (reaction.on_fulfilled)(value.clone());
            }
        }));
    }

    /// The settlement transition, rejection side. Same shape as
    /// [`settle_fulfill`](Self::settle_fulfill).
    fn settle_reject(&self, reason: E) {
        let reactions = {
            let mut state = self.shared.state.lock().expect("state lock poisoned");
            let State::Pending { reactions } = &mut *state else {
                trace!("reject after settlement ignored");
                return;
            };
            let reactions = std::mem::take(reactions);
            if reactions.is_empty() {
                *state = State::Rejected(reason);
                return;
            }
            *state = State::Rejected(reason.clone());
            reactions
        };
        trace!(reactions = reactions.len(), "rejected, scheduling dispatch");
        self.sched.schedule(Box::new(move || {
            for reaction in reactions {
                (reaction.on_rejected)(reason.clone());
            }
        }));
    }

    /// Registers a raw reaction pair.
    ///
    /// Pending: the pair joins the reaction list and waits for settlement.
    /// Already settled: a single dispatch task for the matching side is
    /// scheduled now, so delivery still lands in a later turn. The lock is
    /// released before touching the scheduler.
    fn subscribe(
        &self,
        on_fulfilled: Box<dyn FnOnce(T) + Send>,
        on_rejected: Box<dyn FnOnce(E) + Send>,
    ) {
        let attach = {
            let mut state = self.shared.state.lock().expect("state lock poisoned");
            match &mut *state {
                State::Pending { reactions } => {
                    reactions.push(Reaction {
                        on_fulfilled,
                        on_rejected,
                    });
                    Attach::Queued
                }
                State::Fulfilled(value) => {
                    Attach::AlreadyFulfilled(value.clone(), on_fulfilled)
                }
                State::Rejected(reason) => Attach::AlreadyRejected(reason.clone(), on_rejected),
            }
        };
        match attach {
            Attach::Queued => {}
            Attach::AlreadyFulfilled(value, on_fulfilled) => {
                trace!("reaction attached after fulfillment, scheduling dispatch");
                self.sched.schedule(Box::new(move || on_fulfilled(value)));
            }
            Attach::AlreadyRejected(reason, on_rejected) => {
                trace!("reaction attached after rejection, scheduling dispatch");
                self.sched.schedule(Box::new(move || on_rejected(reason)));
            }
        }
    }

    /// Settles `self` from a handler's return (the adoption step shared by
    /// both `then` sides).
    fn adopt(&self, reacted: Result<Eventual<T, E>, E>) {
        match reacted {
            Ok(Eventual::Ready(value)) => self.settle_fulfill(value),
            Ok(Eventual::Deferred(inner)) => {
                let fulfill_out = self.clone();
                let reject_out = self.clone();
                inner.subscribe(
                    Box::new(move |value| fulfill_out.settle_fulfill(value)),
                    Box::new(move |reason| reject_out.settle_reject(reason)),
                );
            }
            Err(reason) => self.settle_reject(reason),
        }
    }
}

//! Race combinator: first settlement wins, by either outcome.

use crate::deferred::Deferred;
use crate::eventual::Eventual;
use crate::schedule::SchedulerHandle;

/// Settles identically to whichever input settles first.
///
/// Every input is normalized through the `resolve` factory, so a plain value
/// wins over any still-pending deferred input. The first settlement —
/// fulfillment or rejection alike — decides the output; later settlements of
/// the losing inputs are absorbed silently by the output's settle-once
/// guard. Losers are not awaited, cancelled, or reported.
///
/// An empty input never settles.
///
/// # Example
///
/// ```
/// use deferred::{race, Deferred, Eventual, TurnQueue};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let queue = Arc::new(TurnQueue::new());
/// let sched = queue.handle();
///
/// let winner = race(&sched, vec![
///     Eventual::Deferred(Deferred::<&str, String>::resolve_after(
///         &sched,
///         Eventual::Ready("slow"),
///         Duration::from_millis(50),
///     )),
///     Eventual::Deferred(Deferred::resolve_after(
///         &sched,
///         Eventual::Ready("fast"),
///         Duration::from_millis(5),
///     )),
/// ]);
///
/// queue.advance(Duration::from_millis(50));
/// assert_eq!(winner.try_result(), Some(Ok("fast")));
/// ```
pub fn race<T, E>(sched: &SchedulerHandle, inputs: Vec<Eventual<T, E>>) -> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let (deferred, settler) = Deferred::pending(sched);
    for input in inputs {
        let normalized = Deferred::resolve(sched, input);
        let fulfill = settler.clone();
        let reject = settler.clone();
        normalized.then(
            move |value| {
                fulfill.fulfill(value);
                Ok(Eventual::Ready(()))
            },
            move |reason| {
                reject.reject(reason);
                Ok(Eventual::Ready(()))
            },
        );
    }
    deferred
}

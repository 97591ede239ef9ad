//! All combinator: every input must fulfill, first rejection wins.

use crate::deferred::Deferred;
use crate::eventual::Eventual;
use crate::schedule::SchedulerHandle;
use std::sync::{Arc, Mutex};

/// Results gathered so far, aligned by input index.
struct Gather<T> {
    slots: Vec<Option<T>>,
    missing: usize,
}

/// Waits for every input to fulfill.
///
/// Returns a deferred value that fulfills with the inputs' results in input
/// order once **every** input has fulfilled, regardless of the order they
/// finish in, or rejects with the reason of the **first** input to reject.
/// Remaining inputs are not awaited further after a rejection; their
/// eventual settlements are absorbed by the output's settle-once guard.
///
/// An empty input fulfills immediately with an empty vec.
///
/// # Example
///
/// ```
/// use deferred::{all, Deferred, Eventual, TurnQueue};
/// use std::sync::Arc;
///
/// let queue = Arc::new(TurnQueue::new());
/// let sched = queue.handle();
///
/// let gathered = all(&sched, vec![
///     Eventual::Ready(1),
///     Eventual::Deferred(Deferred::<i32, String>::fulfilled(&sched, 2)),
/// ]);
///
/// queue.run_until_idle();
/// assert_eq!(gathered.try_result(), Some(Ok(vec![1, 2])));
/// ```
pub fn all<T, E>(sched: &SchedulerHandle, inputs: Vec<Eventual<T, E>>) -> Deferred<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let (deferred, settler) = Deferred::pending(sched);
    let total = inputs.len();
    if total == 0 {
        settler.fulfill(Vec::new());
        return deferred;
    }

    let gathered = Arc::new(Mutex::new(Gather {
        slots: vec![None; total],
        missing: total,
    }));

    for (index, input) in inputs.into_iter().enumerate() {
        let normalized = Deferred::resolve(sched, input);
        let gathered = Arc::clone(&gathered);
        let fulfill = settler.clone();
        let reject = settler.clone();
        normalized.then(
            move |value| {
                let mut gather = gathered.lock().expect("gather lock poisoned");
                gather.slots[index] = Some(value);
                gather.missing -= 1;
                if gather.missing == 0 {
                    let results = gather
                        .slots
                        .iter_mut()
                        .map(|slot| slot.take().expect("every slot filled at completion"))
                        .collect();
                    fulfill.fulfill(results);
                }
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

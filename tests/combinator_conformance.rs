//! Conformance suite for the `all` and `race` combinators and the factories
//! they are built on.
//!
//! Timing-sensitive scenarios run against the virtual clock, so completion
//! order is controlled exactly.

mod common;

use deferred::{all, race, Deferred, Eventual};
use std::time::Duration;

#[test]
fn all_rejects_with_the_first_rejection() {
    let (queue, sched) = common::queue();
    let gathered = all(
        &sched,
        vec![
            Eventual::Ready(1),
            Eventual::Deferred(Deferred::fulfilled(&sched, 2)),
            Eventual::Deferred(Deferred::reject_after(
                &sched,
                "boom",
                Duration::from_millis(10),
            )),
        ],
    );

    queue.advance(Duration::from_millis(10));
    assert_eq!(gathered.try_result(), Some(Err("boom")));
}

#[test]
fn all_preserves_index_order_despite_completion_order() {
    let (queue, sched) = common::queue();
    let gathered = all::<i32, &str>(
        &sched,
        vec![
            Eventual::Deferred(Deferred::resolve_after(
                &sched,
                Eventual::Ready(1),
                Duration::from_millis(5),
            )),
            Eventual::Deferred(Deferred::resolve_after(
                &sched,
                Eventual::Ready(2),
                Duration::from_millis(1),
            )),
        ],
    );

    queue.advance(Duration::from_millis(1));
    assert!(gathered.is_pending());

    queue.advance(Duration::from_millis(4));
    assert_eq!(gathered.try_result(), Some(Ok(vec![1, 2])));
}

#[test]
fn race_settles_like_the_fastest_input() {
    let (queue, sched) = common::queue();
    let winner = race::<&str, &str>(
        &sched,
        vec![
            Eventual::Deferred(Deferred::resolve_after(
                &sched,
                Eventual::Ready("slow"),
                Duration::from_millis(50),
            )),
            Eventual::Deferred(Deferred::resolve_after(
                &sched,
                Eventual::Ready("fast"),
                Duration::from_millis(5),
            )),
        ],
    );

    queue.advance(Duration::from_millis(50));
    assert_eq!(winner.try_result(), Some(Ok("fast")));
}

#[test]
fn race_ignores_settlements_after_the_winner() {
    let (queue, sched) = common::queue();
    let winner = race::<i32, &str>(
        &sched,
        vec![
            Eventual::Deferred(Deferred::reject_after(
                &sched,
                "slow failure",
                Duration::from_millis(30),
            )),
            Eventual::Deferred(Deferred::resolve_after(
                &sched,
                Eventual::Ready(1),
                Duration::from_millis(5),
            )),
        ],
    );

    queue.advance(Duration::from_millis(30));
    assert_eq!(winner.try_result(), Some(Ok(1)));
}

#[test]
fn resolve_unwraps_a_nested_resolved_value_once() {
    let (queue, sched) = common::queue();
    let inner = Deferred::<i32, &str>::fulfilled(&sched, 5);
    let outer = Deferred::resolve(&sched, Eventual::Deferred(inner));

    queue.run_until_idle();
    assert_eq!(outer.try_result(), Some(Ok(5)));
}

#[test]
fn resolve_after_defers_the_unwrap_decision() {
    let (queue, sched) = common::queue();
    let (inner, inner_settler) = Deferred::<i32, &str>::pending(&sched);
    let outer = Deferred::resolve_after(
        &sched,
        Eventual::Deferred(inner),
        Duration::from_millis(10),
    );

    // Inner settles before the delay elapses; the outer decision is still
    // deferred until the deadline.
    inner_settler.fulfill(3);
    queue.advance(Duration::from_millis(9));
    assert!(outer.is_pending());

    queue.advance(Duration::from_millis(1));
    assert_eq!(outer.try_result(), Some(Ok(3)));
}

#[test]
fn all_with_every_input_plain_is_one_dispatch_away() {
    let (queue, sched) = common::queue();
    let gathered = all::<i32, &str>(
        &sched,
        vec![Eventual::Ready(1), Eventual::Ready(2), Eventual::Ready(3)],
    );

    assert!(gathered.is_pending());
    queue.run_until_idle();
    assert_eq!(gathered.try_result(), Some(Ok(vec![1, 2, 3])));
}

#[test]
fn race_of_two_plain_values_picks_the_first() {
    let (queue, sched) = common::queue();
    let winner = race::<i32, &str>(
        &sched,
        vec![Eventual::Ready(1), Eventual::Ready(2)],
    );

    queue.run_until_idle();
    assert_eq!(winner.try_result(), Some(Ok(1)));
}

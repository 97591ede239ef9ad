//! Shared helpers for the conformance suites.
#![allow(dead_code)]

use deferred::{SchedulerHandle, TurnQueue};
use std::sync::{Arc, Mutex};

/// Builds a fresh turn queue and its scheduling capability.
pub fn queue() -> (Arc<TurnQueue>, SchedulerHandle) {
    let queue = Arc::new(TurnQueue::new());
    let handle = queue.handle();
    (queue, handle)
}

/// An order recorder shared between reactions and assertions.
pub type Recorder<T> = Arc<Mutex<Vec<T>>>;

/// Creates an empty recorder.
pub fn recorder<T>() -> Recorder<T> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshots the recorder contents.
pub fn seen<T: Clone>(recorder: &Recorder<T>) -> Vec<T> {
    recorder.lock().unwrap().clone()
}

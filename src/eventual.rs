//! Plain-or-deferred value wrapper.
//!
//! Anywhere the original callback contract accepts "a value or a deferred
//! value" (handler returns, combinator inputs, the `resolve` factory), this
//! crate uses [`Eventual`] to make the distinction explicit in the type
//! system instead of relying on a runtime instance test.

use crate::deferred::Deferred;
use core::fmt;

/// Either a value that is already available, or a [`Deferred`] that will
/// produce one.
///
/// `Ready` values are treated as already fulfilled wherever an `Eventual` is
/// consumed. `Deferred` values are adopted: the consumer mirrors the inner
/// value's eventual settlement, fulfilled or rejected.
pub enum Eventual<T, E> {
    /// A plain value, available now.
    Ready(T),
    /// A deferred value, settled later (or possibly already).
    Deferred(Deferred<T, E>),
}

impl<T, E> Eventual<T, E> {
    /// Returns true if this holds a plain value.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true if this holds a deferred value.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Eventual<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(inner) => f.debug_tuple("Deferred").field(inner).finish(),
        }
    }
}

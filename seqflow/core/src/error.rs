//! Error Types
//!
//! Errors surfaced by the operators in this crate. Cancellation and deadline
//! errors are plain values so they can travel in-band (see
//! [`crate::timing::timeout`]) as well as out-of-band from the blocking
//! terminal operations.

use std::fmt;

use thiserror::Error;

/// Why a pipeline stopped before its source was exhausted
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum FlowError {
    /// The cancellation token was cancelled explicitly
    #[error("operation cancelled")]
    Cancelled,

    /// A deadline elapsed (token timeout, or the `timeout` operator's quiet period)
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl FlowError {
    /// Whether this error came from a deadline rather than an explicit cancel
    #[must_use]
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// A terminal operation that was interrupted, together with what it had
/// accumulated before the interruption
///
/// Partial results are never silently discarded: callers that only care about
/// the error can use [`Partial::error`], callers that want the data can use
/// [`Partial::into_value`].
#[derive(Clone, PartialEq, Eq)]
pub struct Partial<T> {
    value: T,
    error: FlowError,
}

impl<T> Partial<T> {
    /// Wrap a partial value with the error that interrupted it
    #[must_use]
    pub fn new(value: T, error: FlowError) -> Self {
        Self { value, error }
    }

    /// The interruption cause
    #[must_use]
    pub fn error(&self) -> FlowError {
        self.error
    }

    /// Borrow the partial result
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the partial result
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into the partial result and the cause
    #[must_use]
    pub fn into_parts(self) -> (T, FlowError) {
        (self.value, self.error)
    }
}

impl<T> fmt::Debug for Partial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Partial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (partial result retained)", self.error)
    }
}

impl<T> std::error::Error for Partial<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

//! Faults surfaced through a promise instead of a typed result.

use std::any::Any;

use thiserror::Error;

/// Why a promise settled without a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The work closure panicked; carries the panic message.
    #[error("scheduled work panicked: {0}")]
    Panicked(String),

    /// The work was discarded before it ran, or its owner was disposed.
    #[error("work was cancelled before it completed")]
    Cancelled,
}

impl TaskError {
    /// Builds a `Panicked` error from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }
}

/// Extracts the message of a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

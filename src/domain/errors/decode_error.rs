//! Decoder failure type.

use std::any::Any;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::panic_message;

/// Why an image could not be produced. Cloned into every caller that asks
/// for a path whose decode failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum DecodeError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("unsupported or corrupt image: {0}")]
    Format(String),

    #[error("decoder panicked: {0}")]
    Panicked(String),
}

impl DecodeError {
    /// Classifies an I/O error raised while opening `path`.
    #[must_use]
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io(format!("{}: {err}", path.display()))
        }
    }

    /// Wraps a panic caught around a decoder call.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }
}

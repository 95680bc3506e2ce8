//! Port definition for image decoding.

use std::path::Path;

use crate::domain::errors::DecodeError;

/// Turns a file into a bitmap.
///
/// Called synchronously from inside the I/O scheduler's drain loop, so it
/// may block on disk access freely.
pub trait Decoder: Send + Sync + 'static {
    /// Decoded bitmap type.
    type Image: Send + Sync + 'static;

    /// Loads and decodes the image at `path`.
    ///
    /// # Errors
    /// Returns `DecodeError` if the file is missing, unreadable, or not a
    /// supported image.
    fn load(&self, path: &Path) -> Result<Self::Image, DecodeError>;
}

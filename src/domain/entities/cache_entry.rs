//! Cached decode results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ImageKey;
use crate::domain::errors::DecodeError;

/// Outcome of decoding one image. Failures are cached just like successes.
pub type ImageResult<I> = Result<Arc<I>, DecodeError>;

/// One slot of the image cache.
///
/// The stored result never changes once the entry is published. Only the
/// access stamp moves, and only when the cache refreshes stamps on hits.
#[derive(Debug)]
pub struct CacheEntry<I> {
    key: ImageKey,
    last_access: AtomicU64,
    result: ImageResult<I>,
}

impl<I> CacheEntry<I> {
    /// Creates an entry stamped with `stamp`.
    #[must_use]
    pub fn new(key: ImageKey, stamp: u64, result: ImageResult<I>) -> Self {
        Self {
            key,
            last_access: AtomicU64::new(stamp),
            result,
        }
    }

    /// Returns the cache key.
    #[must_use]
    pub fn key(&self) -> &ImageKey {
        &self.key
    }

    /// Returns the stored decode result.
    #[must_use]
    pub fn result(&self) -> &ImageResult<I> {
        &self.result
    }

    /// Returns the access stamp used for purge ranking.
    #[must_use]
    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    /// Moves the access stamp forward. Never moves it back.
    pub fn touch(&self, stamp: u64) {
        self.last_access.fetch_max(stamp, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::domain::entities::CaseSensitivity;

    #[test]
    fn test_touch_is_monotonic() {
        let key = ImageKey::normalize(Path::new("a.png"), CaseSensitivity::Sensitive);
        let entry = CacheEntry::new(key, 5, Ok(Arc::new(())));

        entry.touch(9);
        assert_eq!(entry.last_access(), 9);

        entry.touch(3);
        assert_eq!(entry.last_access(), 9);
    }

    #[test]
    fn test_failed_entry_keeps_error() {
        let key = ImageKey::normalize(Path::new("bad.png"), CaseSensitivity::Sensitive);
        let entry: CacheEntry<()> =
            CacheEntry::new(key, 1, Err(DecodeError::Format("truncated".to_string())));

        assert_eq!(
            entry.result().as_ref().err(),
            Some(&DecodeError::Format("truncated".to_string()))
        );
    }
}

//! Typed outcome of raw file reads.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Result type for raw file loads.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Expected, recoverable failures when reading a file.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
}

impl LoadError {
    /// Classifies an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(source),
            }
        }
    }

    /// Returns the path that failed to load.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } => path,
        }
    }

    /// Returns whether the file was missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

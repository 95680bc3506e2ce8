//! Cache identity for image paths.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How paths are compared when looking up cached images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    /// `a.png` and `A.PNG` are the same image.
    Insensitive,
    /// Paths are compared byte for byte.
    Sensitive,
}

impl CaseSensitivity {
    /// Matches the host file system's usual behaviour.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Normalized path used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    /// Normalizes `path` according to `case`.
    ///
    /// Case-insensitive keys are upper-cased with Unicode default casing,
    /// which does not depend on the process locale.
    #[must_use]
    pub fn normalize(path: &Path, case: CaseSensitivity) -> Self {
        let raw = path.to_string_lossy();
        match case {
            CaseSensitivity::Sensitive => Self(raw.into_owned()),
            CaseSensitivity::Insensitive => Self(raw.to_uppercase()),
        }
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

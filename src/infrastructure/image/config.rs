//! Image cache settings.

use serde::{Deserialize, Serialize};

use crate::domain::entities::CaseSensitivity;
use crate::domain::errors::ConfigError;

/// Default maximum number of cached decode results.
/// One decoded photo is roughly 16 MB, so 30 entries stay under 500 MB.
pub const DEFAULT_MAX_ITEMS: usize = 30;

/// Default number of entries kept when the cache is purged.
pub const DEFAULT_PURGE_SIZE: usize = 20;

/// Which entries survive a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Keep the most recently inserted entries. Hits do not count.
    #[default]
    Insertion,
    /// Keep the most recently inserted or hit entries.
    Recency,
}

/// Configuration for the image cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry count that triggers a purge.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Entries kept by a purge, before the new entry is added.
    #[serde(default = "default_purge_size")]
    pub purge_size: usize,

    /// Whether `a.png` and `A.PNG` name the same image.
    #[serde(default)]
    pub case_sensitivity: CaseSensitivity,

    /// Purge ranking.
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_purge_size() -> usize {
    DEFAULT_PURGE_SIZE
}

impl CacheConfig {
    /// Checks that a purge actually frees space.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidCache` if `max_items` is zero or
    /// `purge_size` is not smaller than `max_items`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::InvalidCache(
                "max_items must be at least 1".to_string(),
            ));
        }
        if self.purge_size >= self.max_items {
            return Err(ConfigError::InvalidCache(format!(
                "purge_size ({}) must be smaller than max_items ({})",
                self.purge_size, self.max_items
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            purge_size: DEFAULT_PURGE_SIZE,
            case_sensitivity: CaseSensitivity::default(),
            eviction: EvictionPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(30, 20, true ; "defaults")]
    #[test_case(1, 0, true ; "single_slot")]
    #[test_case(0, 0, false ; "zero_capacity")]
    #[test_case(10, 10, false ; "purge_keeps_everything")]
    #[test_case(10, 12, false ; "purge_larger_than_capacity")]
    fn test_validate(max_items: usize, purge_size: usize, valid: bool) {
        let config = CacheConfig {
            max_items,
            purge_size,
            ..CacheConfig::default()
        };
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn test_parse_partial_table() {
        let config: CacheConfig = toml::from_str(
            r#"
            purge_size = 5
            eviction = "recency"
            case_sensitivity = "insensitive"
        "#,
        )
        .expect("Failed to parse cache config");

        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(config.purge_size, 5);
        assert_eq!(config.eviction, EvictionPolicy::Recency);
        assert_eq!(config.case_sensitivity, CaseSensitivity::Insensitive);
    }
}

//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::entities::CaseSensitivity;
use crate::infrastructure::image::CacheConfig;

const APP_NAME: &str = "imgflight";
const APP_QUALIFIER: &str = "org";
const APP_ORGANIZATION: &str = "imgflight";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by CLI.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(max_items) = args.max_items {
            self.cache.max_items = max_items;
        }
        if let Some(purge_size) = args.purge_size {
            self.cache.purge_size = purge_size;
        }
        if let Some(case_sensitive) = args.case_sensitive {
            self.cache.case_sensitivity = if case_sensitive {
                CaseSensitivity::Sensitive
            } else {
                CaseSensitivity::Insensitive
            };
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::image::{DEFAULT_MAX_ITEMS, EvictionPolicy};
    use clap::Parser;

    #[test]
    fn test_parse_config_with_cache_table() {
        let toml_content = r#"
            log_level = "debug"

            [cache]
            max_items = 12
            eviction = "recency"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_path, None);
        assert_eq!(config.cache.max_items, 12);
        assert_eq!(config.cache.eviction, EvictionPolicy::Recency);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.cache.max_items, DEFAULT_MAX_ITEMS);
        assert!(config.cache.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config: AppConfig = toml::from_str(
            r#"
            log_level = "warn"

            [cache]
            max_items = 12
            case_sensitivity = "sensitive"
        "#,
        )
        .expect("Failed to parse config");

        let args = CliArgs::parse_from([
            "imgflight",
            "--log-level",
            "trace",
            "--purge-size",
            "4",
            "--case-sensitive",
            "false",
            "a.png",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.cache.max_items, 12);
        assert_eq!(config.cache.purge_size, 4);
        assert_eq!(config.cache.case_sensitivity, CaseSensitivity::Insensitive);
        assert_eq!(args.paths, vec![PathBuf::from("a.png")]);
    }
}

use super::app_config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::errors::ConfigError;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Locates and reads the configuration file.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Create a new `StorageManager`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = AppConfig::default_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
        Ok(Self { config_dir })
    }

    /// Creates a new `StorageManager` with a specific directory (useful for testing).
    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    /// Loads the application configuration.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let config_path = path_override.map_or_else(
            || self.config_dir.join(CONFIG_FILE_NAME),
            std::path::Path::to_path_buf,
        );

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.config = Some(config_path);
        Ok(config)
    }

    /// Loads the configuration, falling back to the defaults when the file
    /// does not parse.
    ///
    /// Runs before logging is set up, so the parse failure is handed back
    /// for the caller to report.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read.
    pub fn load_or_default(
        &self,
        path_override: Option<&Path>,
    ) -> Result<(AppConfig, Option<ConfigError>), ConfigError> {
        match self.load_config(path_override) {
            Ok(config) => Ok((config, None)),
            Err(error @ ConfigError::TomlDe(_)) => Ok((AppConfig::default(), Some(error))),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::LogLevel;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let storage = StorageManager::with_dir(temp.path().to_path_buf());

        let config = storage.load_config(None).unwrap();
        assert_eq!(config.cache, AppConfig::default().cache);
        assert!(!temp.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reads_override_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "[cache]\nmax_items = 8\npurge_size = 3\n").unwrap();

        let storage = StorageManager::with_dir(temp.path().to_path_buf());
        let config = storage.load_config(Some(&path)).unwrap();

        assert_eq!(config.cache.max_items, 8);
        assert_eq!(config.cache.purge_size, 3);
        assert_eq!(config.config, Some(path));
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "cache = [not toml").unwrap();

        let storage = StorageManager::with_dir(temp.path().to_path_buf());
        assert!(matches!(storage.load_config(None), Err(ConfigError::TomlDe(_))));
    }

    #[test]
    fn test_load_or_default_hands_back_parse_failure() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "cache = [not toml").unwrap();

        let storage = StorageManager::with_dir(temp.path().to_path_buf());
        let (config, rejected) = storage.load_or_default(None).unwrap();

        assert_eq!(config.log_level, AppConfig::default().log_level);
        assert_eq!(config.cache, AppConfig::default().cache);
        assert!(matches!(rejected, Some(ConfigError::TomlDe(_))));
    }

    #[test]
    fn test_load_or_default_without_problems() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "log_level = \"debug\"\n").unwrap();

        let storage = StorageManager::with_dir(temp.path().to_path_buf());
        let (config, rejected) = storage.load_or_default(None).unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(rejected.is_none());
    }
}

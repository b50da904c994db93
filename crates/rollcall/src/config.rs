//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{AttendanceStore, RecoveryPolicy};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default attendance document file name.
const DATA_FILE_NAME: &str = "attendance.json";

/// Prefix of environment variables that override configuration.
const ENV_PREFIX: &str = "ROLLCALL_";

/// Development fallback for the shared admin password.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections split on `__`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Admin configuration.
    pub admin: AdminConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the attendance document.
    /// Defaults to `~/.local/share/rollcall/attendance.json`
    pub data_path: Option<PathBuf>,
    /// What to do with a malformed document.
    pub recovery: RecoveryPolicy,
}

/// Admin-related configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared password for reset and export.
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.admin.password.is_empty() {
            return Err(Error::ConfigValidation {
                message: "admin.password must not be empty".to_string(),
            });
        }

        if let Some(path) = &self.storage.data_path {
            if path.file_name().is_none() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "storage.data_path must name a file, got {}",
                        path.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the attendance document path, resolving defaults if not set.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.storage
            .data_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Build a store for the configured document.
    #[must_use]
    pub fn store(&self) -> AttendanceStore {
        AttendanceStore::new(self.data_path()).with_recovery_policy(self.storage.recovery)
    }

    /// Check a candidate admin password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the password does not match.
    pub fn check_admin_password(&self, candidate: &str) -> Result<()> {
        if candidate == self.admin.password {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.data_path.is_none());
        assert_eq!(config.storage.recovery, RecoveryPolicy::Reset);
        assert_eq!(config.admin.password, "admin123");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_password() {
        let mut config = Config::default();
        config.admin.password = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("admin.password"));
    }

    #[test]
    fn test_validate_data_path_without_file_name() {
        let mut config = Config::default();
        config.storage.data_path = Some(PathBuf::from("/"));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("storage.data_path"));
    }

    #[test]
    fn test_data_path_default() {
        let config = Config::default();
        let path = config.data_path();

        assert!(path.to_string_lossy().contains("rollcall"));
        assert!(path.to_string_lossy().ends_with("attendance.json"));
    }

    #[test]
    fn test_data_path_custom() {
        let mut config = Config::default();
        config.storage.data_path = Some(PathBuf::from("/srv/rollcall/data.json"));

        assert_eq!(config.data_path(), PathBuf::from("/srv/rollcall/data.json"));
    }

    #[test]
    fn test_store_uses_configured_path_and_policy() {
        let mut config = Config::default();
        config.storage.data_path = Some(PathBuf::from("/srv/rollcall/data.json"));
        config.storage.recovery = RecoveryPolicy::Backup;

        let store = config.store();
        assert_eq!(store.path(), PathBuf::from("/srv/rollcall/data.json"));
        assert_eq!(store.recovery_policy(), RecoveryPolicy::Backup);
    }

    #[test]
    fn test_check_admin_password() {
        let config = Config::default();
        assert!(config.check_admin_password("admin123").is_ok());
        assert!(config
            .check_admin_password("wrong")
            .unwrap_err()
            .is_unauthorized());
    }

    #[test]
    fn test_admin_password_not_in_debug() {
        let mut config = Config::default();
        config.admin.password = "hunter2".to_string();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("Config"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("rollcall"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            "[storage]\ndata_path = \"/srv/att.json\"\nrecovery = \"backup\"\n\n[admin]\npassword = \"s3cret\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(file)).unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/srv/att.json"));
        assert_eq!(config.storage.recovery, RecoveryPolicy::Backup);
        assert!(config.check_admin_password("s3cret").is_ok());
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "[admin]\npassword = \"\"\n").unwrap();

        let err = Config::load_from(Some(file)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"data_path": "/tmp/a.json", "recovery": "backup"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.data_path, Some(PathBuf::from("/tmp/a.json")));
        assert_eq!(storage.recovery, RecoveryPolicy::Backup);
    }
}

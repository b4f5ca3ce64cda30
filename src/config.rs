//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults and
//! environment overrides for the state store.

use crate::error::ConfigError;
use crate::storage::config::StorageConfig;
use crate::storage::SettlePolicy;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "ci-deployer.yaml";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// State store configuration
    pub store: StorageConfig,
    /// Container teardown configuration
    pub teardown: TeardownConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Container teardown configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Wait between the last version delete and the bucket delete
    pub settle: SettlePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log4rs configuration file
    pub config_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "log_config.yaml".to_string(),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Defaults { missing: String },
}

impl ConfigSource {
    /// Report the source; callers that set up logging from the loaded
    /// configuration call this once the logger is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path),
            ConfigSource::Defaults { missing } => warn!("Config file {} not found, using defaults", missing),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, use defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from `path`, then apply environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let (config, source) = Self::load_with_source(path)?;
        source.log();
        Ok(config)
    }

    /// Same as `load_from` but logs nothing, returning the source instead.
    pub fn load_with_source(path: impl AsRef<Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let path = path.as_ref();
        let (mut config, source) = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let config: AppConfig = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?;
            (config, ConfigSource::File(path.display().to_string()))
        } else {
            let missing = path.display().to_string();
            (Self::default(), ConfigSource::Defaults { missing })
        };
        config.store.apply_env();
        Ok((config, source))
    }
}

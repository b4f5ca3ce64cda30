//! Application State Management
//!
//! This module provides the application state that holds the configured
//! state store and the settings it was built from.

use std::sync::Arc;
use log::info;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::storage::config::StorageBackend;
use crate::storage::ObjectStore;

/// Application state containing the store and its configuration
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state configured from YAML and environment
    pub fn new() -> Result<Self, ConfigError> {
        let config = AppConfig::load()?;
        Self::from_config(config)
    }

    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Result<Self, ConfigError> {
        info!("Initializing application state with {:?} store in {}", config.store.backend, config.store.region);
        let store = config.store.create_store(config.teardown.settle)?;
        Ok(Self { store, config })
    }

    /// Create application state for testing with the in-memory backend
    pub fn new_for_testing() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.store.backend = StorageBackend::Mock;
        config.teardown.settle = crate::storage::SettlePolicy::Fixed { delay_ms: 0 };
        Self::from_config(config)
    }
}

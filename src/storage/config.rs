//! Configuration for state store backends

use crate::error::ConfigError;
use crate::storage::mock_store::{MockObjectBackend, DEFAULT_PAGE_SIZE};
use crate::storage::s3_backend::S3Backend;
use crate::storage::{ObjectStore, ObjectStoreBackend, SettlePolicy, VersionedStore, LEGACY_DEFAULT_REGION};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Available state store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Mock,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(StorageBackend::S3),
            "mock" | "memory" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Configuration for the state store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Region every container is created in
    pub region: String,
    /// S3-compatible endpoint override
    pub endpoint: Option<String>,
    /// Listing page size for the mock backend
    pub page_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            region: LEGACY_DEFAULT_REGION.to_string(),
            endpoint: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StorageConfig {
    /// Create a new storage configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `STATE_BACKEND`, `AWS_REGION` and `STATE_ENDPOINT`
    pub fn apply_env(&mut self) {
        if let Ok(backend_str) = env::var("STATE_BACKEND") {
            match backend_str.parse::<StorageBackend>() {
                Ok(backend) => {
                    info!("Using state backend from environment: {:?}", backend);
                    self.backend = backend;
                }
                Err(e) => warn!("Invalid state backend in environment: {}. Keeping {:?}.", e, self.backend),
            }
        }
        if let Ok(region) = env::var("AWS_REGION") {
            if !region.trim().is_empty() {
                self.region = region.trim().to_string();
            }
        }
        if let Ok(endpoint) = env::var("STATE_ENDPOINT") {
            self.endpoint = if endpoint.trim().is_empty() {
                None
            } else {
                Some(endpoint.trim().to_string())
            };
        }
    }

    /// Create the raw provider backend
    pub fn create_backend(&self) -> Result<Arc<dyn ObjectStoreBackend>, ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                variable: "store.region".to_string(),
                message: "region must not be empty".to_string(),
            });
        }
        match self.backend {
            StorageBackend::S3 => Ok(Arc::new(S3Backend::connect(&self.region, self.endpoint.as_deref())?)),
            StorageBackend::Mock => {
                if self.page_size == 0 {
                    return Err(ConfigError::InvalidValue {
                        variable: "store.page_size".to_string(),
                        message: "page size must be at least 1".to_string(),
                    });
                }
                Ok(Arc::new(MockObjectBackend::new(self.region.clone()).with_page_size(self.page_size)))
            }
        }
    }

    /// Create a state store instance based on the configuration
    pub fn create_store(&self, settle: SettlePolicy) -> Result<Arc<dyn ObjectStore>, ConfigError> {
        let backend = self.create_backend()?;
        info!("State store ready: {:?} backend in {}", self.backend, self.region);
        Ok(Arc::new(VersionedStore::new(backend, settle)))
    }
}

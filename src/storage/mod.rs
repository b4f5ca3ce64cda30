//! Versioned State Store
//!
//! This module provides the object-store abstraction the deployment
//! workflows persist their state through. The [`ObjectStore`] trait is the
//! capability the orchestration layer consumes; [`VersionedStore`] is the
//! real implementation layered over any [`ObjectStoreBackend`] (AWS S3 or
//! the in-memory mock), and [`FakeObjectStore`] is a scripted stand-in.

pub mod backend;
pub mod bootstrap;
pub mod bucket;
pub mod client;
pub mod config;
pub mod fake_store;
pub mod mock_store;
pub mod s3_backend;
pub mod versioned_store;


use crate::error::StoreError;
use serde::{Deserialize, Serialize};

pub use self::backend::ObjectStoreBackend;
pub use self::bucket::{BucketManager, SettlePolicy, LEGACY_DEFAULT_REGION};
pub use self::fake_store::FakeObjectStore;
pub use self::versioned_store::VersionedStore;

/// Outcome of ensuring a container exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// The container was created (and versioned) by this call
    Created,
    /// The container was already there
    AlreadyExisted,
}

impl ContainerStatus {
    pub fn was_created(self) -> bool {
        self == ContainerStatus::Created
    }
}

/// Result of a get-or-create on a blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredBlob {
    pub content: Vec<u8>,
    /// True only when this call wrote the default content
    pub was_created: bool,
}

/// Trait defining the state store capability
pub trait ObjectStore: Send + Sync {
    /// Region the store is bound to
    fn region(&self) -> &str;

    /// Create the container with versioning enabled unless it already exists
    fn ensure_container(&self, name: &str) -> Result<ContainerStatus, StoreError>;

    /// Delete every object version in the container, then the container
    fn destroy_container(&self, name: &str) -> Result<(), StoreError>;

    /// Replace the content of an object
    fn write(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StoreError>;

    /// Read the latest content of an object
    fn load(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Check whether an object exists
    fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError>;

    /// Delete an object
    fn delete(&self, container: &str, key: &str) -> Result<(), StoreError>;

    /// Get the blob, seeding it with `default_content` if absent
    fn ensure_blob_exists(&self, container: &str, key: &str, default_content: &[u8]) -> Result<EnsuredBlob, StoreError>;
}

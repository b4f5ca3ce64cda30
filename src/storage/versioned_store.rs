//! ObjectStore implementation composed from the object client, bucket
//! manager and blob bootstrapper

use crate::error::StoreError;
use crate::storage::backend::ObjectStoreBackend;
use crate::storage::bootstrap::ensure_blob_exists;
use crate::storage::bucket::{BucketManager, SettlePolicy};
use crate::storage::client::ObjectClient;
use crate::storage::{ContainerStatus, EnsuredBlob, ObjectStore};
use std::sync::Arc;

/// State store over a provider backend
pub struct VersionedStore {
    objects: ObjectClient,
    buckets: BucketManager,
}

impl VersionedStore {
    /// Create a store with injected backend
    pub fn new(backend: Arc<dyn ObjectStoreBackend>, settle: SettlePolicy) -> Self {
        Self {
            objects: ObjectClient::new(backend.clone()),
            buckets: BucketManager::new(backend, settle),
        }
    }

    pub fn objects(&self) -> &ObjectClient {
        &self.objects
    }

    pub fn buckets(&self) -> &BucketManager {
        &self.buckets
    }
}

impl ObjectStore for VersionedStore {
    fn region(&self) -> &str {
        self.buckets.region()
    }

    fn ensure_container(&self, name: &str) -> Result<ContainerStatus, StoreError> {
        self.buckets.ensure_container(name)
    }

    fn destroy_container(&self, name: &str) -> Result<(), StoreError> {
        self.buckets.destroy_container(name)
    }

    fn write(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        self.objects.write(container, key, content)
    }

    fn load(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects.load(container, key)
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError> {
        self.objects.exists(container, key)
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StoreError> {
        self.objects.delete(container, key)
    }

    fn ensure_blob_exists(&self, container: &str, key: &str, default_content: &[u8]) -> Result<EnsuredBlob, StoreError> {
        ensure_blob_exists(&self.objects, container, key, default_content)
    }
}

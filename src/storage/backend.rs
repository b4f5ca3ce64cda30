//! Provider-facing backend interface
//!
//! One method per provider request. Implementations report failures as raw
//! [`ProviderError`]s; classification happens in the layers above.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Version id the provider assigns to objects written while versioning was off
pub const NULL_VERSION_ID: &str = "null";

/// Outgoing create-bucket request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketRequest {
    pub bucket: String,
    /// Regional placement; `None` means the provider's legacy default region
    pub location_constraint: Option<String>,
}

/// One entry of a version listing: a stored version or a delete marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectVersionEntry {
    pub key: String,
    pub version_id: String,
    pub is_delete_marker: bool,
    pub is_latest: bool,
}

/// Continuation point of a truncated version listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMarker {
    pub key_marker: String,
    pub version_id_marker: String,
}

/// A single page of a version listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub entries: Vec<ObjectVersionEntry>,
    /// Set when the listing was truncated and more pages follow
    pub next: Option<VersionMarker>,
}

/// Raw object-store provider
pub trait ObjectStoreBackend: Send + Sync {
    /// Region the backend session is bound to
    fn region(&self) -> &str;

    fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError>;

    fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), ProviderError>;

    fn enable_versioning(&self, bucket: &str) -> Result<(), ProviderError>;

    /// List one page of versions and delete markers, starting after `marker`
    fn list_object_versions(
        &self,
        bucket: &str,
        marker: Option<&VersionMarker>,
    ) -> Result<VersionPage, ProviderError>;

    /// Permanently remove one version (or delete marker)
    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<(), ProviderError>;

    fn delete_bucket(&self, bucket: &str) -> Result<(), ProviderError>;

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ProviderError>;

    /// Fetch the latest version, fully buffered
    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError>;

    fn head_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError>;

    /// Unversioned delete; on a versioned bucket this lays down a delete marker
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError>;
}

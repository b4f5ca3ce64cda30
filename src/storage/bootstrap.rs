//! Get-or-create for configuration blobs

use crate::error::StoreError;
use crate::storage::client::ObjectClient;
use crate::storage::EnsuredBlob;
use log::{debug, info};

/// Return the blob's content if present, otherwise seed it with `default_content`.
///
/// Only a not-found load leads to a write. Any other load failure aborts
/// before anything is written.
pub fn ensure_blob_exists(
    objects: &ObjectClient,
    container: &str,
    key: &str,
    default_content: &[u8],
) -> Result<EnsuredBlob, StoreError> {
    match objects.load(container, key) {
        Ok(content) => {
            debug!("Found existing {}/{} ({} bytes)", container, key, content.len());
            Ok(EnsuredBlob {
                content,
                was_created: false,
            })
        }
        Err(StoreError::NotFound { .. }) => {
            objects.write(container, key, default_content)?;
            info!("Seeded {}/{} with default content", container, key);
            Ok(EnsuredBlob {
                content: default_content.to_vec(),
                was_created: true,
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::storage::backend::{CreateBucketRequest, ObjectStoreBackend};
    use crate::storage::mock_store::{BackendOp, MockObjectBackend};
    use std::sync::Arc;

    fn setup() -> (Arc<MockObjectBackend>, ObjectClient) {
        let backend = Arc::new(MockObjectBackend::default());
        backend
            .create_bucket(&CreateBucketRequest {
                bucket: "cfg-store".to_string(),
                location_constraint: None,
            })
            .unwrap();
        backend.enable_versioning("cfg-store").unwrap();
        (backend.clone(), ObjectClient::new(backend))
    }

    #[test]
    fn test_seeds_once() {
        let (_, objects) = setup();
        let first = ensure_blob_exists(&objects, "cfg-store", "state.json", b"{}").unwrap();
        assert_eq!(first.content, b"{}");
        assert!(first.was_created);

        let second = ensure_blob_exists(&objects, "cfg-store", "state.json", b"{}").unwrap();
        assert_eq!(second.content, b"{}");
        assert!(!second.was_created);
    }

    #[test]
    fn test_later_defaults_are_ignored() {
        let (backend, objects) = setup();
        ensure_blob_exists(&objects, "cfg-store", "k", b"first").unwrap();
        let again = ensure_blob_exists(&objects, "cfg-store", "k", b"second").unwrap();
        assert_eq!(again.content, b"first");
        assert!(!again.was_created);
        assert_eq!(backend.version_count("cfg-store"), 1);
    }

    #[test]
    fn test_load_failure_aborts_without_write() {
        let (backend, objects) = setup();
        backend.fail_after(BackendOp::GetObject, 0, ProviderError::new("AccessDenied", "Access Denied"));

        let err = ensure_blob_exists(&objects, "cfg-store", "k", b"{}").unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(backend.call_count(BackendOp::PutObject), 0);
    }

    #[test]
    fn test_write_failure_surfaces() {
        let (backend, objects) = setup();
        backend.fail_after(BackendOp::PutObject, 0, ProviderError::new("SlowDown", "slow down"));
        assert!(ensure_blob_exists(&objects, "cfg-store", "k", b"{}").is_err());
    }
}

//! Single-object operations addressed by (container, key)

use crate::error::{classify, StoreError};
use crate::storage::backend::ObjectStoreBackend;
use bytes::Bytes;
use log::debug;
use std::sync::Arc;

fn object_path(container: &str, key: &str) -> String {
    format!("{}/{}", container, key)
}

/// Object store client that provides write/load/exists/delete on top of a backend
pub struct ObjectClient {
    backend: Arc<dyn ObjectStoreBackend>,
}

impl ObjectClient {
    pub fn new(backend: Arc<dyn ObjectStoreBackend>) -> Self {
        Self { backend }
    }

    /// Replace the object's content; adds a version on versioned containers
    pub fn write(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        self.backend
            .put_object(container, key, Bytes::copy_from_slice(content))
            .map_err(|e| classify("write", &object_path(container, key), e))?;
        debug!("Wrote {} bytes to {}/{}", content.len(), container, key);
        Ok(())
    }

    /// Read the whole object into memory. Sized for configuration blobs.
    pub fn load(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        match self.backend.get_object(container, key) {
            Ok(body) => Ok(body.to_vec()),
            Err(e) => {
                let err = classify("load", &object_path(container, key), e);
                if err.is_not_found() {
                    debug!("Load of {}/{} found nothing", container, key);
                }
                Err(err)
            }
        }
    }

    /// `Ok(false)` for a missing object or container, errors for anything else
    pub fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError> {
        match self.backend.head_object(container, key) {
            Ok(()) => Ok(true),
            Err(e) => match classify("exists", &object_path(container, key), e) {
                StoreError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    /// Delete the object. A missing object counts as already deleted.
    pub fn delete(&self, container: &str, key: &str) -> Result<(), StoreError> {
        match self.backend.delete_object(container, key) {
            Ok(()) => Ok(()),
            Err(e) => match classify("delete", &object_path(container, key), e) {
                StoreError::NotFound { resource } => {
                    debug!("Delete of {} skipped, not found", resource);
                    Ok(())
                }
                other => Err(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::storage::backend::CreateBucketRequest;
    use crate::storage::mock_store::{BackendOp, MockObjectBackend};

    fn client_with_bucket(name: &str) -> (Arc<MockObjectBackend>, ObjectClient) {
        let backend = Arc::new(MockObjectBackend::default());
        backend
            .create_bucket(&CreateBucketRequest {
                bucket: name.to_string(),
                location_constraint: None,
            })
            .unwrap();
        backend.enable_versioning(name).unwrap();
        let client = ObjectClient::new(backend.clone());
        (backend, client)
    }

    #[test]
    fn test_write_then_load() {
        let (_, client) = client_with_bucket("b");
        let samples: [&[u8]; 4] = [b"", b"{}", b"\x00\xffbinary", "ünïcode".as_bytes()];
        for content in samples {
            client.write("b", "k", content).unwrap();
            assert_eq!(client.load("b", "k").unwrap(), content);
        }
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_, client) = client_with_bucket("b");
        let err = client.load("b", "missing").unwrap_err();
        assert!(err.is_not_found());

        let err = client.load("no-bucket", "k").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_transport_failure() {
        let (backend, client) = client_with_bucket("b");
        backend.fail_after(BackendOp::GetObject, 0, ProviderError::new("InternalError", "We encountered an internal error."));
        let err = client.load("b", "k").unwrap_err();
        match err {
            StoreError::Transport { source, .. } => assert_eq!(source.code(), Some("InternalError")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exists_never_written_and_after_delete() {
        let (_, client) = client_with_bucket("b");
        assert!(!client.exists("b", "k").unwrap());

        client.write("b", "k", b"data").unwrap();
        assert!(client.exists("b", "k").unwrap());

        client.delete("b", "k").unwrap();
        assert!(!client.exists("b", "k").unwrap());
    }

    #[test]
    fn test_exists_propagates_other_failures() {
        let (backend, client) = client_with_bucket("b");
        backend.fail_after(BackendOp::HeadObject, 0, ProviderError::new("AccessDenied", "Access Denied"));
        assert!(client.exists("b", "k").is_err());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_, client) = client_with_bucket("b");
        client.delete("b", "never-written").unwrap();
        client.delete("no-bucket", "k").unwrap();
    }

    #[test]
    fn test_delete_failure_surfaces() {
        let (backend, client) = client_with_bucket("b");
        backend.fail_after(BackendOp::DeleteObject, 0, ProviderError::uncoded("connection reset by peer"));
        assert!(client.delete("b", "k").is_err());
    }
}

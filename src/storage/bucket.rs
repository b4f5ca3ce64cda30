//! Versioned bucket lifecycle: region-aware creation and full teardown

use crate::error::{classify, StoreError};
use crate::storage::backend::{CreateBucketRequest, ObjectStoreBackend, ObjectVersionEntry, VersionMarker};
use crate::storage::ContainerStatus;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The provider's legacy default region. Create requests aimed at it must
/// not carry a location constraint; every other region requires one.
pub const LEGACY_DEFAULT_REGION: &str = "us-east-1";

/// How to wait between the last version delete and the bucket delete.
///
/// Delete acknowledgements can race the bucket being reported empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SettlePolicy {
    /// Sleep for a fixed delay
    Fixed { delay_ms: u64 },
    /// Re-list until the bucket reports no versions, or the timeout expires
    PollUntilEmpty { interval_ms: u64, timeout_ms: u64 },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::PollUntilEmpty {
            interval_ms: 250,
            timeout_ms: 10_000,
        }
    }
}

/// Lazy, finite sequence of version-listing pages for one bucket.
///
/// Yields one `Ok(page)` per provider round trip and stops after the last
/// page or the first error.
pub struct VersionPages<'a> {
    backend: &'a dyn ObjectStoreBackend,
    container: String,
    marker: Option<VersionMarker>,
    finished: bool,
}

impl<'a> VersionPages<'a> {
    fn new(backend: &'a dyn ObjectStoreBackend, container: &str) -> Self {
        Self {
            backend,
            container: container.to_string(),
            marker: None,
            finished: false,
        }
    }

    /// Start again from the first page
    pub fn restart(&mut self) {
        self.marker = None;
        self.finished = false;
    }
}

impl Iterator for VersionPages<'_> {
    type Item = Result<Vec<ObjectVersionEntry>, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.backend.list_object_versions(&self.container, self.marker.as_ref()) {
            Ok(page) => {
                self.marker = page.next;
                self.finished = self.marker.is_none();
                Some(Ok(page.entries))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(classify("list object versions", &self.container, e)))
            }
        }
    }
}

/// Creates and destroys versioned buckets
pub struct BucketManager {
    backend: Arc<dyn ObjectStoreBackend>,
    settle: SettlePolicy,
}

impl BucketManager {
    pub fn new(backend: Arc<dyn ObjectStoreBackend>, settle: SettlePolicy) -> Self {
        Self { backend, settle }
    }

    pub fn region(&self) -> &str {
        self.backend.region()
    }

    /// Location constraint to send with create requests in the session region
    pub fn location_constraint(&self) -> Option<String> {
        let region = self.backend.region();
        if region == LEGACY_DEFAULT_REGION {
            None
        } else {
            Some(region.to_string())
        }
    }

    pub fn container_exists(&self, name: &str) -> Result<bool, StoreError> {
        match self.backend.head_bucket(name) {
            Ok(()) => Ok(true),
            Err(e) => match classify("head bucket", name, e) {
                StoreError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    /// Create the bucket with versioning unless it already exists.
    ///
    /// Versioning is (re)applied to an existing bucket as well, so a retry
    /// after a failed enablement leaves the bucket versioned.
    pub fn ensure_container(&self, name: &str) -> Result<ContainerStatus, StoreError> {
        if self.container_exists(name)? {
            debug!("Bucket {} already exists", name);
            self.enable_versioning(name)?;
            return Ok(ContainerStatus::AlreadyExisted);
        }

        let request = CreateBucketRequest {
            bucket: name.to_string(),
            location_constraint: self.location_constraint(),
        };
        self.backend
            .create_bucket(&request)
            .map_err(|e| classify("create bucket", name, e))?;
        info!("Created bucket {} in {}", name, self.backend.region());

        self.enable_versioning(name)?;
        Ok(ContainerStatus::Created)
    }

    fn enable_versioning(&self, name: &str) -> Result<(), StoreError> {
        self.backend
            .enable_versioning(name)
            .map_err(|e| classify("enable versioning", name, e))
    }

    /// Page through every version and delete marker in the bucket
    pub fn version_pages(&self, name: &str) -> VersionPages<'_> {
        VersionPages::new(self.backend.as_ref(), name)
    }

    pub fn list_versions(&self, name: &str) -> Result<Vec<ObjectVersionEntry>, StoreError> {
        let mut versions = Vec::new();
        for page in self.version_pages(name) {
            versions.extend(page?);
        }
        Ok(versions)
    }

    /// Delete every version in the bucket, then the bucket itself.
    ///
    /// An absent bucket is treated as already destroyed. A failure while
    /// deleting versions stops before the bucket delete is attempted and is
    /// always reported as `PartialTeardown`, never as `NotFound`, since the
    /// bucket is still there.
    pub fn destroy_container(&self, name: &str) -> Result<(), StoreError> {
        let _mdc = log_mdc::insert_scoped("container", name);

        let versions = match self.list_versions(name) {
            Ok(versions) => versions,
            Err(StoreError::NotFound { .. }) => {
                info!("Bucket {} does not exist, nothing to destroy", name);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let total = versions.len();
        info!("Deleting {} versions from bucket {}", total, name);
        for (deleted, version) in versions.iter().enumerate() {
            if let Err(e) = self
                .backend
                .delete_object_version(name, &version.key, &version.version_id)
            {
                let cause = classify("delete object version", &format!("{}/{}", name, version.key), e);
                warn!(
                    "Teardown of {} stopped at {}@{} after {} of {} versions: {}",
                    name, version.key, version.version_id, deleted, total, cause
                );
                return Err(StoreError::PartialTeardown {
                    container: name.to_string(),
                    deleted,
                    total,
                    source: Box::new(cause),
                });
            }
        }

        self.settle(name)?;

        match self.backend.delete_bucket(name) {
            Ok(()) => {
                info!("Deleted bucket {}", name);
                Ok(())
            }
            Err(e) => match classify("delete bucket", name, e) {
                StoreError::NotFound { .. } => {
                    info!("Bucket {} vanished before delete", name);
                    Ok(())
                }
                other => Err(other),
            },
        }
    }

    fn settle(&self, name: &str) -> Result<(), StoreError> {
        match self.settle {
            SettlePolicy::Fixed { delay_ms } => {
                if delay_ms > 0 {
                    debug!("Waiting {}ms before deleting bucket {}", delay_ms, name);
                    thread::sleep(Duration::from_millis(delay_ms));
                }
                Ok(())
            }
            SettlePolicy::PollUntilEmpty { interval_ms, timeout_ms } => {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms);
                loop {
                    let page = match self.backend.list_object_versions(name, None) {
                        Ok(page) => page,
                        Err(e) => {
                            return match classify("list object versions", name, e) {
                                StoreError::NotFound { .. } => Ok(()),
                                other => Err(other),
                            }
                        }
                    };
                    if page.entries.is_empty() {
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        // Let the bucket delete report what is left
                        warn!(
                            "Bucket {} still lists {} versions after {}ms",
                            name,
                            page.entries.len(),
                            timeout_ms
                        );
                        return Ok(());
                    }
                    thread::sleep(Duration::from_millis(interval_ms));
                }
            }
        }
    }
}

//! In-memory implementation of ObjectStoreBackend for testing
//!
//! Behaves like a versioned S3 bucket store: monotonically issued version
//! ids, delete markers, paged version listings with key/version markers,
//! provider-style error codes, and region-checked bucket creation.

use crate::error::{ProviderError, CODE_NOT_FOUND, CODE_NO_SUCH_BUCKET, CODE_NO_SUCH_KEY};
use crate::storage::backend::{
    CreateBucketRequest, ObjectStoreBackend, ObjectVersionEntry, VersionMarker, VersionPage,
    NULL_VERSION_ID,
};
use crate::storage::bucket::LEGACY_DEFAULT_REGION;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Page size the real provider uses for version listings
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Backend requests, used to script failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    HeadBucket,
    CreateBucket,
    EnableVersioning,
    ListObjectVersions,
    DeleteObjectVersion,
    DeleteBucket,
    PutObject,
    GetObject,
    HeadObject,
    DeleteObject,
}

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    /// `None` for a delete marker
    body: Option<Bytes>,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MockBucket {
    versioning: bool,
    /// key -> versions, oldest first
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

#[derive(Debug)]
struct ScriptedFailure {
    successes_left: usize,
    error: ProviderError,
}

#[derive(Debug, Default)]
struct MockState {
    buckets: HashMap<String, MockBucket>,
    next_version: u64,
    create_requests: Vec<CreateBucketRequest>,
    failures: HashMap<BackendOp, ScriptedFailure>,
    calls: HashMap<BackendOp, usize>,
    /// Listings that still report deleted versions once a bucket empties
    stale_listings: usize,
    /// Last non-empty listing per bucket, replayed while listings are stale
    last_listing: HashMap<String, Vec<ObjectVersionEntry>>,
}

/// Mock implementation of ObjectStoreBackend for testing
pub struct MockObjectBackend {
    region: String,
    page_size: usize,
    state: Mutex<MockState>,
}

fn no_such_bucket(bucket: &str) -> ProviderError {
    ProviderError::new(CODE_NO_SUCH_BUCKET, format!("The specified bucket does not exist: {}", bucket))
}

fn etag(body: &[u8]) -> String {
    hex::encode(md5::compute(body).0)
}

impl MockObjectBackend {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Shrink listing pages so pagination is exercised with few objects
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Let `op` succeed `successes` more times, then fail once with `error`
    pub fn fail_after(&self, op: BackendOp, successes: usize, error: ProviderError) {
        self.state().failures.insert(
            op,
            ScriptedFailure {
                successes_left: successes,
                error,
            },
        );
    }

    /// After a bucket empties, keep reporting its last versions for `polls`
    /// more listings. The bucket refuses deletion until they have been served.
    pub fn linger_listings(&self, polls: usize) {
        self.state().stale_listings = polls;
    }

    /// Number of times `op` has been requested, failed requests included
    pub fn call_count(&self, op: BackendOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    /// Every create-bucket request received, in order
    pub fn create_requests(&self) -> Vec<CreateBucketRequest> {
        self.state().create_requests.clone()
    }

    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.state().buckets.contains_key(bucket)
    }

    pub fn versioning_enabled(&self, bucket: &str) -> Option<bool> {
        self.state().buckets.get(bucket).map(|b| b.versioning)
    }

    /// Total versions and delete markers retained in a bucket
    pub fn version_count(&self, bucket: &str) -> usize {
        self.state()
            .buckets
            .get(bucket)
            .map(|b| b.objects.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Last-modified time of the latest version of a key
    pub fn last_modified(&self, bucket: &str, key: &str) -> Option<DateTime<Utc>> {
        Self::latest_version(&self.state(), bucket, key).map(|v| v.last_modified)
    }

    /// ETag of the latest live version of a key
    pub fn etag(&self, bucket: &str, key: &str) -> Option<String> {
        Self::latest_version(&self.state(), bucket, key)
            .filter(|v| v.body.is_some())
            .map(|v| v.etag.clone())
    }

    /// Record the call and trip any scripted failure for it
    fn begin(&self, state: &mut MockState, op: BackendOp) -> Result<(), ProviderError> {
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(failure) = state.failures.get_mut(&op) {
            if failure.successes_left == 0 {
                let failure = state.failures.remove(&op);
                if let Some(failure) = failure {
                    debug!("Mock: scripted failure for {:?}: {}", op, failure.error);
                    return Err(failure.error);
                }
            } else {
                failure.successes_left -= 1;
            }
        }
        Ok(())
    }

    fn issue_version_id(state: &mut MockState) -> String {
        state.next_version += 1;
        format!("{:020}", state.next_version)
    }

    fn write_version(state: &mut MockState, bucket: &str, key: &str, body: Option<Bytes>) -> Result<(), ProviderError> {
        let versioning = state
            .buckets
            .get(bucket)
            .map(|b| b.versioning)
            .ok_or_else(|| no_such_bucket(bucket))?;
        let version_id = if versioning {
            Self::issue_version_id(state)
        } else {
            NULL_VERSION_ID.to_string()
        };
        let version = StoredVersion {
            version_id,
            etag: body.as_deref().map(etag).unwrap_or_default(),
            body,
            last_modified: Utc::now(),
        };
        let objects = &mut state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .objects;
        let versions = objects.entry(key.to_string()).or_default();
        if !versioning {
            // The null version is overwritten in place
            versions.retain(|v| v.version_id != NULL_VERSION_ID);
        }
        versions.push(version);
        Ok(())
    }

    fn latest_version<'s>(state: &'s MockState, bucket: &str, key: &str) -> Option<&'s StoredVersion> {
        state.buckets.get(bucket).and_then(|b| b.objects.get(key)).and_then(|versions| versions.last())
    }

    fn latest_body(state: &MockState, bucket: &str, key: &str) -> Result<Option<Bytes>, ProviderError> {
        let b = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(b.objects
            .get(key)
            .and_then(|versions| versions.last())
            .and_then(|v| v.body.clone()))
    }
}

impl Default for MockObjectBackend {
    fn default() -> Self {
        Self::new(LEGACY_DEFAULT_REGION)
    }
}

impl ObjectStoreBackend for MockObjectBackend {
    fn region(&self) -> &str {
        &self.region
    }

    fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::HeadBucket)?;
        if state.buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(ProviderError::new(CODE_NOT_FOUND, "Not Found"))
        }
    }

    fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::CreateBucket)?;
        state.create_requests.push(request.clone());

        match request.location_constraint.as_deref() {
            None if self.region != LEGACY_DEFAULT_REGION => {
                return Err(ProviderError::new(
                    "IllegalLocationConstraintException",
                    format!(
                        "The unspecified location constraint is incompatible for the region specific endpoint this request was sent to ({})",
                        self.region
                    ),
                ));
            }
            Some(LEGACY_DEFAULT_REGION) => {
                return Err(ProviderError::new(
                    "InvalidLocationConstraint",
                    "The specified location-constraint is not valid",
                ));
            }
            Some(constraint) if constraint != self.region => {
                return Err(ProviderError::new(
                    "IllegalLocationConstraintException",
                    format!("The {} location constraint is incompatible for the region specific endpoint this request was sent to ({})", constraint, self.region),
                ));
            }
            _ => {}
        }

        if state.buckets.contains_key(&request.bucket) {
            return Err(ProviderError::new(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it.",
            ));
        }
        state.buckets.insert(request.bucket.clone(), MockBucket::default());
        info!("Mock: created bucket {} in {}", request.bucket, self.region);
        Ok(())
    }

    fn enable_versioning(&self, bucket: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::EnableVersioning)?;
        let b = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        b.versioning = true;
        Ok(())
    }

    fn list_object_versions(
        &self,
        bucket: &str,
        marker: Option<&VersionMarker>,
    ) -> Result<VersionPage, ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::ListObjectVersions)?;
        let b = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        // Keys ascending, versions of one key newest first
        let all: Vec<ObjectVersionEntry> = b
            .objects
            .iter()
            .flat_map(|(key, versions)| {
                let latest = versions.len().saturating_sub(1);
                versions.iter().enumerate().rev().map(move |(i, v)| ObjectVersionEntry {
                    key: key.clone(),
                    version_id: v.version_id.clone(),
                    is_delete_marker: v.body.is_none(),
                    is_latest: i == latest,
                })
            })
            .collect();

        let start = match marker {
            None => 0,
            Some(m) => all
                .iter()
                .position(|e| e.key == m.key_marker && e.version_id == m.version_id_marker)
                .map(|i| i + 1)
                .unwrap_or_else(|| {
                    all.iter()
                        .position(|e| e.key.as_str() > m.key_marker.as_str())
                        .unwrap_or(all.len())
                }),
        };

        if all.is_empty() && state.stale_listings > 0 {
            if let Some(stale) = state.last_listing.get(bucket).cloned() {
                state.stale_listings -= 1;
                debug!("Mock: stale listing of {} ({} versions)", bucket, stale.len());
                return Ok(VersionPage {
                    entries: stale,
                    next: None,
                });
            }
        } else if !all.is_empty() {
            state.last_listing.insert(bucket.to_string(), all.clone());
        }

        let end = (start + self.page_size).min(all.len());
        let entries = all[start..end].to_vec();
        let next = if end < all.len() {
            entries.last().map(|last| VersionMarker {
                key_marker: last.key.clone(),
                version_id_marker: last.version_id.clone(),
            })
        } else {
            None
        };
        Ok(VersionPage { entries, next })
    }

    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::DeleteObjectVersion)?;
        let b = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if let Some(versions) = b.objects.get_mut(key) {
            versions.retain(|v| v.version_id != version_id);
            if versions.is_empty() {
                b.objects.remove(key);
            }
        }
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::DeleteBucket)?;
        let b = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let lingering = state.stale_listings > 0 && state.last_listing.contains_key(bucket);
        if !b.objects.is_empty() || lingering {
            return Err(ProviderError::new(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty. You must delete all versions in the bucket.",
            ));
        }
        state.buckets.remove(bucket);
        state.last_listing.remove(bucket);
        info!("Mock: deleted bucket {}", bucket);
        Ok(())
    }

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::PutObject)?;
        let size = body.len();
        Self::write_version(&mut state, bucket, key, Some(body))?;
        let tag = Self::latest_version(&state, bucket, key).map(|v| v.etag.clone()).unwrap_or_default();
        debug!("Mock: wrote {} bytes to {}/{} (etag {})", size, bucket, key, tag);
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::GetObject)?;
        Self::latest_body(&state, bucket, key)?
            .ok_or_else(|| ProviderError::new(CODE_NO_SUCH_KEY, format!("The specified key does not exist: {}", key)))
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::HeadObject)?;
        // HEAD responses carry no body, so every miss is a bare 404
        match Self::latest_version(&state, bucket, key) {
            Some(v) if v.body.is_some() => {
                debug!("Mock: head {}/{} last modified {}", bucket, key, v.last_modified.to_rfc3339());
                Ok(())
            }
            _ => Err(ProviderError::new(CODE_NOT_FOUND, "Not Found")),
        }
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        self.begin(&mut state, BackendOp::DeleteObject)?;
        let versioning = state
            .buckets
            .get(bucket)
            .map(|b| b.versioning)
            .ok_or_else(|| no_such_bucket(bucket))?;
        if versioning {
            Self::write_version(&mut state, bucket, key, None)?;
        } else if let Some(b) = state.buckets.get_mut(bucket) {
            b.objects.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with_bucket(name: &str, versioned: bool) -> MockObjectBackend {
        let backend = MockObjectBackend::default();
        backend
            .create_bucket(&CreateBucketRequest {
                bucket: name.to_string(),
                location_constraint: None,
            })
            .unwrap();
        if versioned {
            backend.enable_versioning(name).unwrap();
        }
        backend
    }

    #[test]
    fn test_versioned_writes_keep_every_version() {
        let backend = backend_with_bucket("b", true);
        for body in ["one", "two", "three"] {
            backend.put_object("b", "k", Bytes::from(body)).unwrap();
        }
        assert_eq!(backend.version_count("b"), 3);
        assert_eq!(backend.get_object("b", "k").unwrap(), Bytes::from("three"));
    }

    #[test]
    fn test_version_ids_are_monotonic() {
        let backend = backend_with_bucket("b", true);
        backend.put_object("b", "a", Bytes::from("1")).unwrap();
        backend.put_object("b", "a", Bytes::from("2")).unwrap();
        let page = backend.list_object_versions("b", None).unwrap();
        assert_eq!(page.entries.len(), 2);
        // newest first
        assert!(page.entries[0].version_id > page.entries[1].version_id);
        assert!(page.entries[0].is_latest);
        assert!(!page.entries[1].is_latest);
    }

    #[test]
    fn test_unversioned_writes_overwrite_null_version() {
        let backend = backend_with_bucket("b", false);
        backend.put_object("b", "k", Bytes::from("one")).unwrap();
        backend.put_object("b", "k", Bytes::from("two")).unwrap();
        assert_eq!(backend.version_count("b"), 1);
        let page = backend.list_object_versions("b", None).unwrap();
        assert_eq!(page.entries[0].version_id, NULL_VERSION_ID);
    }

    #[test]
    fn test_delete_on_versioned_bucket_leaves_marker() {
        let backend = backend_with_bucket("b", true);
        backend.put_object("b", "k", Bytes::from("v")).unwrap();
        backend.delete_object("b", "k").unwrap();

        let err = backend.get_object("b", "k").unwrap_err();
        assert_eq!(err.code(), Some(CODE_NO_SUCH_KEY));
        assert_eq!(backend.version_count("b"), 2);

        let page = backend.list_object_versions("b", None).unwrap();
        assert!(page.entries[0].is_delete_marker);
        assert!(page.entries[0].is_latest);
    }

    #[test]
    fn test_listing_pages_with_markers() {
        let backend = backend_with_bucket("b", true).with_page_size(2);
        for i in 0..5 {
            backend.put_object("b", &format!("key-{}", i % 2), Bytes::from(format!("{}", i))).unwrap();
        }

        let mut seen = Vec::new();
        let mut marker = None;
        loop {
            let page = backend.list_object_versions("b", marker.as_ref()).unwrap();
            assert!(page.entries.len() <= 2);
            seen.extend(page.entries);
            marker = page.next;
            if marker.is_none() {
                break;
            }
        }
        assert_eq!(seen.len(), 5);
        let mut ids: Vec<_> = seen.iter().map(|e| e.version_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_missing_bucket_and_key_codes() {
        let backend = MockObjectBackend::default();
        assert_eq!(backend.head_bucket("nope").unwrap_err().code(), Some(CODE_NOT_FOUND));
        assert_eq!(
            backend.get_object("nope", "k").unwrap_err().code(),
            Some(CODE_NO_SUCH_BUCKET)
        );
        assert_eq!(
            backend.list_object_versions("nope", None).unwrap_err().code(),
            Some(CODE_NO_SUCH_BUCKET)
        );

        let backend = backend_with_bucket("b", true);
        assert_eq!(backend.get_object("b", "k").unwrap_err().code(), Some(CODE_NO_SUCH_KEY));
        assert_eq!(backend.head_object("b", "k").unwrap_err().code(), Some(CODE_NOT_FOUND));
    }

    #[test]
    fn test_non_empty_bucket_cannot_be_deleted() {
        let backend = backend_with_bucket("b", true);
        backend.put_object("b", "k", Bytes::from("v")).unwrap();
        let err = backend.delete_bucket("b").unwrap_err();
        assert_eq!(err.code(), Some("BucketNotEmpty"));
        assert!(backend.bucket_exists("b"));
    }

    #[test]
    fn test_region_checked_on_create() {
        let backend = MockObjectBackend::new("eu-west-2");
        let err = backend
            .create_bucket(&CreateBucketRequest {
                bucket: "b".to_string(),
                location_constraint: None,
            })
            .unwrap_err();
        assert_eq!(err.code(), Some("IllegalLocationConstraintException"));

        backend
            .create_bucket(&CreateBucketRequest {
                bucket: "b".to_string(),
                location_constraint: Some("eu-west-2".to_string()),
            })
            .unwrap();
        assert!(backend.bucket_exists("b"));
        assert_eq!(backend.create_requests().len(), 2);
    }

    #[test]
    fn test_scripted_failure_fires_once_after_successes() {
        let backend = backend_with_bucket("b", true);
        backend.fail_after(BackendOp::PutObject, 1, ProviderError::new("SlowDown", "Please reduce your request rate."));

        assert!(backend.put_object("b", "k", Bytes::from("1")).is_ok());
        let err = backend.put_object("b", "k", Bytes::from("2")).unwrap_err();
        assert_eq!(err.code(), Some("SlowDown"));
        assert!(backend.put_object("b", "k", Bytes::from("3")).is_ok());
        assert_eq!(backend.call_count(BackendOp::PutObject), 3);
    }

    #[test]
    fn test_lingering_listings_replay_deleted_versions() {
        let backend = backend_with_bucket("b", true);
        backend.put_object("b", "k", Bytes::from("v")).unwrap();
        let listed = backend.list_object_versions("b", None).unwrap().entries;
        backend.linger_listings(2);
        backend.delete_object_version("b", "k", &listed[0].version_id).unwrap();

        for _ in 0..2 {
            assert_eq!(backend.list_object_versions("b", None).unwrap().entries, listed);
            assert_eq!(backend.delete_bucket("b").unwrap_err().code(), Some("BucketNotEmpty"));
        }
        assert!(backend.list_object_versions("b", None).unwrap().entries.is_empty());
        backend.delete_bucket("b").unwrap();
    }

    #[test]
    fn test_etag_is_md5_of_body() {
        let backend = backend_with_bucket("b", true);
        backend.put_object("b", "k", Bytes::from("hello")).unwrap();
        assert_eq!(
            backend.etag("b", "k").as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
        assert!(backend.last_modified("b", "k").is_some());
    }
}

// Live tests against S3 or an S3-compatible endpoint.
//
// Run with `--ignored` once credentials are available; STATE_ENDPOINT
// points them at a local MinIO instead of AWS.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ci_deployer::storage::s3_backend::S3Backend;
use ci_deployer::storage::{ObjectStore, SettlePolicy, VersionedStore};

fn live_store() -> VersionedStore {
    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let endpoint = std::env::var("STATE_ENDPOINT").ok();
    let backend = S3Backend::connect(&region, endpoint.as_deref()).expect("connect");
    VersionedStore::new(Arc::new(backend), SettlePolicy::default())
}

fn unique_bucket() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("ci-deployer-it-{}", nanos)
}

#[test]
#[ignore]
fn test_live_versioned_lifecycle() {
    let store = live_store();
    let bucket = unique_bucket();

    assert!(store.ensure_container(&bucket).unwrap().was_created());
    assert!(!store.ensure_container(&bucket).unwrap().was_created());

    let ensured = store.ensure_blob_exists(&bucket, "state.json", b"{}").unwrap();
    assert!(ensured.was_created);
    store.write(&bucket, "state.json", b"{\"v\":2}").unwrap();
    store.delete(&bucket, "state.json").unwrap();
    assert!(!store.exists(&bucket, "state.json").unwrap());
    assert_eq!(store.buckets().list_versions(&bucket).unwrap().len(), 3);

    store.destroy_container(&bucket).unwrap();
    store.destroy_container(&bucket).unwrap();
}

#[test]
#[ignore]
fn test_live_missing_object_is_not_found() {
    let store = live_store();
    let bucket = unique_bucket();
    store.ensure_container(&bucket).unwrap();

    assert!(store.load(&bucket, "never-written").unwrap_err().is_not_found());
    assert!(!store.exists(&bucket, "never-written").unwrap());

    store.destroy_container(&bucket).unwrap();
}

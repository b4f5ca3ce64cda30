use std::sync::Arc;

use ci_deployer::app_state::AppState;
use ci_deployer::clients::provisioner::DIRECTOR_PUBLIC_IP;
use ci_deployer::clients::{FakeDeploymentManager, FakePipelineClient, FakeProvisioner, InfraMetadata};
use ci_deployer::deploy_config::{ConfigClient, DeployArgs, StoreConfigClient, CONFIG_KEY};
use ci_deployer::error::StoreError;
use ci_deployer::service::DeployService;
use ci_deployer::storage::mock_store::{BackendOp, MockObjectBackend};
use ci_deployer::storage::{ObjectStore, SettlePolicy, VersionedStore};

fn versioned_store(region: &str) -> (Arc<MockObjectBackend>, Arc<VersionedStore>) {
    let backend = Arc::new(MockObjectBackend::new(region).with_page_size(3));
    let store = Arc::new(VersionedStore::new(backend.clone(), SettlePolicy::default()));
    (backend, store)
}

#[test]
fn test_bootstrap_then_teardown_lifecycle() {
    let state = AppState::new_for_testing().expect("app state");
    let store = state.store;

    assert!(store.ensure_container("cfg-store").unwrap().was_created());
    assert!(!store.ensure_container("cfg-store").unwrap().was_created());

    let first = store.ensure_blob_exists("cfg-store", "state.json", b"{}").unwrap();
    assert_eq!((first.content.as_slice(), first.was_created), (&b"{}"[..], true));
    let second = store.ensure_blob_exists("cfg-store", "state.json", b"{}").unwrap();
    assert_eq!((second.content.as_slice(), second.was_created), (&b"{}"[..], false));

    store.destroy_container("cfg-store").unwrap();
    store.destroy_container("cfg-store").unwrap();
    assert!(store.ensure_container("cfg-store").unwrap().was_created());
}

#[test]
fn test_teardown_with_polling_settle() {
    let (backend, store) = versioned_store("eu-west-1");
    store.ensure_container("cfg-store").unwrap();
    for i in 0..3 {
        store.write("cfg-store", "a", format!("a{}", i).as_bytes()).unwrap();
    }
    store.write("cfg-store", "b", b"b0").unwrap();

    store.destroy_container("cfg-store").unwrap();
    assert_eq!(backend.call_count(BackendOp::DeleteObjectVersion), 4);
    assert!(!backend.bucket_exists("cfg-store"));
}

#[test]
fn test_interrupted_teardown_reports_progress() {
    let (backend, store) = versioned_store("eu-west-1");
    store.ensure_container("cfg-store").unwrap();
    for key in ["a", "b", "c", "d"] {
        store.write("cfg-store", key, b"x").unwrap();
    }
    backend.fail_after(
        BackendOp::DeleteObjectVersion,
        2,
        ci_deployer::error::ProviderError::uncoded("connection reset by peer"),
    );

    match store.destroy_container("cfg-store") {
        Err(StoreError::PartialTeardown { container, deleted, total, .. }) => {
            assert_eq!(container, "cfg-store");
            assert_eq!((deleted, total), (2, 4));
        }
        other => panic!("expected partial teardown, got {:?}", other),
    }
    store.destroy_container("cfg-store").unwrap();
    assert!(!backend.bucket_exists("cfg-store"));
}

#[test]
fn test_deploy_and_destroy_over_store() {
    let (backend, store) = versioned_store("ap-southeast-2");
    let config_client = Arc::new(StoreConfigClient::new(store.clone(), "beta"));
    let provisioner = Arc::new(
        FakeProvisioner::new()
            .on_apply(|_| Ok(()))
            .on_output(|| Ok(InfraMetadata::default().with_output(DIRECTOR_PUBLIC_IP, "198.51.100.4")))
            .on_destroy(|| Ok(())),
    );
    let deployment = Arc::new(
        FakeDeploymentManager::new()
            .on_deploy(|_, _| Ok(b"{\"release\":\"ci\"}".to_vec()))
            .on_delete(|_| Ok(b"{}".to_vec())),
    );
    let pipeline = Arc::new(FakePipelineClient::new().on_set_default_pipeline(|_, config| {
        assert_eq!(config.director_public_ip, "198.51.100.4");
        Ok(())
    }));
    let service = DeployService::new(config_client.clone(), provisioner, deployment, pipeline.clone());

    let args = DeployArgs {
        aws_region: "ap-southeast-2".to_string(),
        ..DeployArgs::default()
    };
    let outcome = service.deploy(&args, true).unwrap();
    assert!(outcome.config_created);

    let bucket = config_client.bucket().to_string();
    assert_eq!(bucket, "ci-deployer-beta-ap-southeast-2-config");
    let requests = backend.create_requests();
    assert_eq!(requests[0].location_constraint.as_deref(), Some("ap-southeast-2"));
    assert!(store.exists(&bucket, CONFIG_KEY).unwrap());
    assert_eq!(config_client.load().unwrap().director_public_ip, "198.51.100.4");

    assert!(!service.deploy(&args, true).unwrap().config_created);

    service.destroy().unwrap();
    assert!(!backend.bucket_exists(&bucket));
    assert!(pipeline.calls().contains(&"set_default_pipeline(ci-deployer-beta)".to_string()));
}

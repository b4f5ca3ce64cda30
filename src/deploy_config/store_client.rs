//! ConfigClient persisted in a versioned container of the state store

use crate::deploy_config::{Config, ConfigClient, DeployArgs, CONFIG_KEY};
use crate::error::ClientError;
use crate::storage::ObjectStore;
use log::{debug, info};
use std::sync::Arc;

/// Config client backed by one container per project and region
pub struct StoreConfigClient {
    store: Arc<dyn ObjectStore>,
    project: String,
    bucket: String,
}

impl StoreConfigClient {
    pub fn new(store: Arc<dyn ObjectStore>, project: &str) -> Self {
        let bucket = Self::bucket_name(project, store.region());
        Self {
            store,
            project: project.to_string(),
            bucket,
        }
    }

    /// Name of the config container for a project in a region
    pub fn bucket_name(project: &str, region: &str) -> String {
        format!("ci-deployer-{}-{}-config", project, region)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ConfigClient for StoreConfigClient {
    fn load(&self) -> Result<Config, ClientError> {
        let bytes = self.store.load(&self.bucket, CONFIG_KEY)?;
        Config::from_json(&bytes)
    }

    fn update(&self, config: &Config) -> Result<(), ClientError> {
        self.store.write(&self.bucket, CONFIG_KEY, &config.to_json()?)?;
        debug!("Updated config for project {}", self.project);
        Ok(())
    }

    fn load_or_create(&self, args: &DeployArgs) -> Result<(Config, bool), ClientError> {
        let default_config = Config::from_args(&self.project, &self.bucket, args)?;
        self.store.ensure_container(&self.bucket)?;
        let ensured = self
            .store
            .ensure_blob_exists(&self.bucket, CONFIG_KEY, &default_config.to_json()?)?;
        if ensured.was_created {
            info!("Created config for project {} in {}", self.project, self.bucket);
        }
        Ok((Config::from_json(&ensured.content)?, ensured.was_created))
    }

    fn store_asset(&self, filename: &str, contents: &[u8]) -> Result<(), ClientError> {
        Ok(self.store.write(&self.bucket, filename, contents)?)
    }

    fn load_asset(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        Ok(self.store.load(&self.bucket, filename)?)
    }

    fn delete_asset(&self, filename: &str) -> Result<(), ClientError> {
        Ok(self.store.delete(&self.bucket, filename)?)
    }

    fn delete_all(&self, config: &Config) -> Result<(), ClientError> {
        let bucket = if config.config_bucket.is_empty() {
            &self.bucket
        } else {
            &config.config_bucket
        };
        self.store.destroy_container(bucket)?;
        info!("Deleted all config for project {}", self.project);
        Ok(())
    }

    fn has_asset(&self, filename: &str) -> Result<bool, ClientError> {
        Ok(self.store.exists(&self.bucket, filename)?)
    }
}

//! Scripted ConfigClient double

use crate::deploy_config::{Config, ConfigClient, DeployArgs};
use crate::error::ClientError;
use std::sync::Mutex;

/// Fake implementation of ConfigClient for testing
#[derive(Default)]
pub struct FakeConfigClient {
    load: Option<Box<dyn Fn() -> Result<Config, ClientError> + Send + Sync>>,
    update: Option<Box<dyn Fn(&Config) -> Result<(), ClientError> + Send + Sync>>,
    load_or_create: Option<Box<dyn Fn(&DeployArgs) -> Result<(Config, bool), ClientError> + Send + Sync>>,
    store_asset: Option<Box<dyn Fn(&str, &[u8]) -> Result<(), ClientError> + Send + Sync>>,
    load_asset: Option<Box<dyn Fn(&str) -> Result<Vec<u8>, ClientError> + Send + Sync>>,
    delete_asset: Option<Box<dyn Fn(&str) -> Result<(), ClientError> + Send + Sync>>,
    delete_all: Option<Box<dyn Fn(&Config) -> Result<(), ClientError> + Send + Sync>>,
    has_asset: Option<Box<dyn Fn(&str) -> Result<bool, ClientError> + Send + Sync>>,
    calls: Mutex<Vec<String>>,
}

impl FakeConfigClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_load(mut self, f: impl Fn() -> Result<Config, ClientError> + Send + Sync + 'static) -> Self {
        self.load = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&Config) -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_load_or_create(
        mut self,
        f: impl Fn(&DeployArgs) -> Result<(Config, bool), ClientError> + Send + Sync + 'static,
    ) -> Self {
        self.load_or_create = Some(Box::new(f));
        self
    }

    pub fn on_store_asset(mut self, f: impl Fn(&str, &[u8]) -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.store_asset = Some(Box::new(f));
        self
    }

    pub fn on_load_asset(mut self, f: impl Fn(&str) -> Result<Vec<u8>, ClientError> + Send + Sync + 'static) -> Self {
        self.load_asset = Some(Box::new(f));
        self
    }

    pub fn on_delete_asset(mut self, f: impl Fn(&str) -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.delete_asset = Some(Box::new(f));
        self
    }

    pub fn on_delete_all(mut self, f: impl Fn(&Config) -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.delete_all = Some(Box::new(f));
        self
    }

    pub fn on_has_asset(mut self, f: impl Fn(&str) -> Result<bool, ClientError> + Send + Sync + 'static) -> Self {
        self.has_asset = Some(Box::new(f));
        self
    }

    /// Calls received so far, formatted as `operation(args)`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(call);
    }
}

impl ConfigClient for FakeConfigClient {
    fn load(&self) -> Result<Config, ClientError> {
        self.record("load()".to_string());
        self.load.as_ref().map_or(Err(ClientError::Unscripted("config load")), |f| f())
    }

    fn update(&self, config: &Config) -> Result<(), ClientError> {
        self.record("update()".to_string());
        self.update
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config update")), |f| f(config))
    }

    fn load_or_create(&self, args: &DeployArgs) -> Result<(Config, bool), ClientError> {
        self.record("load_or_create()".to_string());
        self.load_or_create
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config load_or_create")), |f| f(args))
    }

    fn store_asset(&self, filename: &str, contents: &[u8]) -> Result<(), ClientError> {
        self.record(format!("store_asset({})", filename));
        self.store_asset
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config store_asset")), |f| f(filename, contents))
    }

    fn load_asset(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        self.record(format!("load_asset({})", filename));
        self.load_asset
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config load_asset")), |f| f(filename))
    }

    fn delete_asset(&self, filename: &str) -> Result<(), ClientError> {
        self.record(format!("delete_asset({})", filename));
        self.delete_asset
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config delete_asset")), |f| f(filename))
    }

    fn delete_all(&self, config: &Config) -> Result<(), ClientError> {
        self.record("delete_all()".to_string());
        self.delete_all
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config delete_all")), |f| f(config))
    }

    fn has_asset(&self, filename: &str) -> Result<bool, ClientError> {
        self.record(format!("has_asset({})", filename));
        self.has_asset
            .as_ref()
            .map_or(Err(ClientError::Unscripted("config has_asset")), |f| f(filename))
    }
}

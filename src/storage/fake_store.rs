//! Scripted ObjectStore double
//!
//! Each operation delegates to a closure supplied by the test. Calls with no
//! scripted behaviour fail with an `Unscripted` transport error, and every
//! call is recorded so tests can assert on order.

use crate::error::{ProviderError, StoreError};
use crate::storage::{ContainerStatus, EnsuredBlob, ObjectStore};
use std::sync::Mutex;

type NameFn<T> = Box<dyn Fn(&str) -> Result<T, StoreError> + Send + Sync>;
type ObjectFn<T> = Box<dyn Fn(&str, &str) -> Result<T, StoreError> + Send + Sync>;
type ContentFn<T> = Box<dyn Fn(&str, &str, &[u8]) -> Result<T, StoreError> + Send + Sync>;

/// Fake implementation of ObjectStore for testing
pub struct FakeObjectStore {
    region: String,
    ensure_container: Option<NameFn<ContainerStatus>>,
    destroy_container: Option<NameFn<()>>,
    write: Option<ContentFn<()>>,
    load: Option<ObjectFn<Vec<u8>>>,
    exists: Option<ObjectFn<bool>>,
    delete: Option<ObjectFn<()>>,
    ensure_blob_exists: Option<ContentFn<EnsuredBlob>>,
    calls: Mutex<Vec<String>>,
}

fn unscripted(operation: &'static str, resource: &str) -> StoreError {
    StoreError::Transport {
        operation,
        resource: resource.to_string(),
        source: ProviderError::new("Unscripted", format!("no behaviour scripted for {}", operation)),
    }
}

impl FakeObjectStore {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ensure_container: None,
            destroy_container: None,
            write: None,
            load: None,
            exists: None,
            delete: None,
            ensure_blob_exists: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_ensure_container(
        mut self,
        f: impl Fn(&str) -> Result<ContainerStatus, StoreError> + Send + Sync + 'static,
    ) -> Self {
        self.ensure_container = Some(Box::new(f));
        self
    }

    pub fn on_destroy_container(mut self, f: impl Fn(&str) -> Result<(), StoreError> + Send + Sync + 'static) -> Self {
        self.destroy_container = Some(Box::new(f));
        self
    }

    pub fn on_write(
        mut self,
        f: impl Fn(&str, &str, &[u8]) -> Result<(), StoreError> + Send + Sync + 'static,
    ) -> Self {
        self.write = Some(Box::new(f));
        self
    }

    pub fn on_load(mut self, f: impl Fn(&str, &str) -> Result<Vec<u8>, StoreError> + Send + Sync + 'static) -> Self {
        self.load = Some(Box::new(f));
        self
    }

    pub fn on_exists(mut self, f: impl Fn(&str, &str) -> Result<bool, StoreError> + Send + Sync + 'static) -> Self {
        self.exists = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl Fn(&str, &str) -> Result<(), StoreError> + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }

    pub fn on_ensure_blob_exists(
        mut self,
        f: impl Fn(&str, &str, &[u8]) -> Result<EnsuredBlob, StoreError> + Send + Sync + 'static,
    ) -> Self {
        self.ensure_blob_exists = Some(Box::new(f));
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

impl ObjectStore for FakeObjectStore {
    fn region(&self) -> &str {
        &self.region
    }

    fn ensure_container(&self, name: &str) -> Result<ContainerStatus, StoreError> {
        self.record(format!("ensure_container({})", name));
        match &self.ensure_container {
            Some(f) => f(name),
            None => Err(unscripted("ensure_container", name)),
        }
    }

    fn destroy_container(&self, name: &str) -> Result<(), StoreError> {
        self.record(format!("destroy_container({})", name));
        match &self.destroy_container {
            Some(f) => f(name),
            None => Err(unscripted("destroy_container", name)),
        }
    }

    fn write(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        self.record(format!("write({}/{})", container, key));
        match &self.write {
            Some(f) => f(container, key, content),
            None => Err(unscripted("write", &format!("{}/{}", container, key))),
        }
    }

    fn load(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.record(format!("load({}/{})", container, key));
        match &self.load {
            Some(f) => f(container, key),
            None => Err(unscripted("load", &format!("{}/{}", container, key))),
        }
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StoreError> {
        self.record(format!("exists({}/{})", container, key));
        match &self.exists {
            Some(f) => f(container, key),
            None => Err(unscripted("exists", &format!("{}/{}", container, key))),
        }
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StoreError> {
        self.record(format!("delete({}/{})", container, key));
        match &self.delete {
            Some(f) => f(container, key),
            None => Err(unscripted("delete", &format!("{}/{}", container, key))),
        }
    }

    fn ensure_blob_exists(&self, container: &str, key: &str, default_content: &[u8]) -> Result<EnsuredBlob, StoreError> {
        self.record(format!("ensure_blob_exists({}/{})", container, key));
        match &self.ensure_blob_exists {
            Some(f) => f(container, key, default_content),
            None => Err(unscripted("ensure_blob_exists", &format!("{}/{}", container, key))),
        }
    }
}

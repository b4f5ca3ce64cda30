//! Scripted doubles for the collaborator capabilities
//!
//! Each double records the calls it receives. `cleanup` succeeds unless a
//! behaviour is scripted for it; every other unscripted call fails.

use crate::clients::{DeploymentManager, InfraMetadata, Instance, PipelineClient, Provisioner};
use crate::deploy_config::{Config, DeployArgs};
use crate::error::ClientError;
use std::sync::Mutex;

type Scripted0<T> = Option<Box<dyn Fn() -> Result<T, ClientError> + Send + Sync>>;

#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(call.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

fn run0<T>(f: &Scripted0<T>, operation: &'static str) -> Result<T, ClientError> {
    match f {
        Some(f) => f(),
        None => Err(ClientError::Unscripted(operation)),
    }
}

fn run_cleanup(f: &Scripted0<()>) -> Result<(), ClientError> {
    match f {
        Some(f) => f(),
        None => Ok(()),
    }
}

/// Fake implementation of Provisioner for testing
#[derive(Default)]
pub struct FakeProvisioner {
    apply: Option<Box<dyn Fn(bool) -> Result<(), ClientError> + Send + Sync>>,
    destroy: Scripted0<()>,
    output: Scripted0<InfraMetadata>,
    cleanup: Scripted0<()>,
    calls: CallLog,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_apply(mut self, f: impl Fn(bool) -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.apply = Some(Box::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn() -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.destroy = Some(Box::new(f));
        self
    }

    pub fn on_output(mut self, f: impl Fn() -> Result<InfraMetadata, ClientError> + Send + Sync + 'static) -> Self {
        self.output = Some(Box::new(f));
        self
    }

    pub fn on_cleanup(mut self, f: impl Fn() -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Box::new(f));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }
}

impl Provisioner for FakeProvisioner {
    fn apply(&self, dry_run: bool) -> Result<(), ClientError> {
        self.calls.record(format!("apply({})", dry_run));
        match &self.apply {
            Some(f) => f(dry_run),
            None => Err(ClientError::Unscripted("provisioner apply")),
        }
    }

    fn destroy(&self) -> Result<(), ClientError> {
        self.calls.record("destroy()");
        run0(&self.destroy, "provisioner destroy")
    }

    fn output(&self) -> Result<InfraMetadata, ClientError> {
        self.calls.record("output()");
        run0(&self.output, "provisioner output")
    }

    fn cleanup(&self) -> Result<(), ClientError> {
        self.calls.record("cleanup()");
        run_cleanup(&self.cleanup)
    }
}

/// Fake implementation of DeploymentManager for testing
#[derive(Default)]
pub struct FakeDeploymentManager {
    deploy: Option<Box<dyn Fn(&[u8], bool) -> Result<Vec<u8>, ClientError> + Send + Sync>>,
    delete: Option<Box<dyn Fn(&[u8]) -> Result<Vec<u8>, ClientError> + Send + Sync>>,
    instances: Scripted0<Vec<Instance>>,
    cleanup: Scripted0<()>,
    calls: CallLog,
}

impl FakeDeploymentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_deploy(mut self, f: impl Fn(&[u8], bool) -> Result<Vec<u8>, ClientError> + Send + Sync + 'static) -> Self {
        self.deploy = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl Fn(&[u8]) -> Result<Vec<u8>, ClientError> + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }

    pub fn on_instances(mut self, f: impl Fn() -> Result<Vec<Instance>, ClientError> + Send + Sync + 'static) -> Self {
        self.instances = Some(Box::new(f));
        self
    }

    pub fn on_cleanup(mut self, f: impl Fn() -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Box::new(f));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }
}

impl DeploymentManager for FakeDeploymentManager {
    fn deploy(&self, state: &[u8], detach: bool) -> Result<Vec<u8>, ClientError> {
        self.calls.record(format!("deploy({} bytes, {})", state.len(), detach));
        match &self.deploy {
            Some(f) => f(state, detach),
            None => Err(ClientError::Unscripted("deployment deploy")),
        }
    }

    fn delete(&self, state: &[u8]) -> Result<Vec<u8>, ClientError> {
        self.calls.record(format!("delete({} bytes)", state.len()));
        match &self.delete {
            Some(f) => f(state),
            None => Err(ClientError::Unscripted("deployment delete")),
        }
    }

    fn instances(&self) -> Result<Vec<Instance>, ClientError> {
        self.calls.record("instances()");
        run0(&self.instances, "deployment instances")
    }

    fn cleanup(&self) -> Result<(), ClientError> {
        self.calls.record("cleanup()");
        run_cleanup(&self.cleanup)
    }
}

/// Fake implementation of PipelineClient for testing
#[derive(Default)]
pub struct FakePipelineClient {
    set_default_pipeline: Option<Box<dyn Fn(&DeployArgs, &Config) -> Result<(), ClientError> + Send + Sync>>,
    can_connect: Scripted0<bool>,
    cleanup: Scripted0<()>,
    calls: CallLog,
}

impl FakePipelineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_set_default_pipeline(
        mut self,
        f: impl Fn(&DeployArgs, &Config) -> Result<(), ClientError> + Send + Sync + 'static,
    ) -> Self {
        self.set_default_pipeline = Some(Box::new(f));
        self
    }

    pub fn on_can_connect(mut self, f: impl Fn() -> Result<bool, ClientError> + Send + Sync + 'static) -> Self {
        self.can_connect = Some(Box::new(f));
        self
    }

    pub fn on_cleanup(mut self, f: impl Fn() -> Result<(), ClientError> + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Box::new(f));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }
}

impl PipelineClient for FakePipelineClient {
    fn set_default_pipeline(&self, args: &DeployArgs, config: &Config) -> Result<(), ClientError> {
        self.calls.record(format!("set_default_pipeline({})", config.deployment));
        match &self.set_default_pipeline {
            Some(f) => f(args, config),
            None => Err(ClientError::Unscripted("pipeline set_default_pipeline")),
        }
    }

    fn can_connect(&self) -> Result<bool, ClientError> {
        self.calls.record("can_connect()");
        run0(&self.can_connect, "pipeline can_connect")
    }

    fn cleanup(&self) -> Result<(), ClientError> {
        self.calls.record("cleanup()");
        run_cleanup(&self.cleanup)
    }
}

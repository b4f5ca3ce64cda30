//! External collaborator capabilities
//!
//! Infrastructure provisioning, release deployment and pipeline setup are
//! performed by independently versioned tools. The orchestration layer only
//! sees them through these traits; [`fakes`] holds scripted stand-ins.

pub mod deployment;
pub mod fakes;
pub mod pipeline;
pub mod provisioner;

pub use self::deployment::{DeploymentManager, Instance};
pub use self::fakes::{FakeDeploymentManager, FakePipelineClient, FakeProvisioner};
pub use self::pipeline::PipelineClient;
pub use self::provisioner::{InfraMetadata, Provisioner};

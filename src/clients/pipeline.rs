//! Pipeline configuration capability

use crate::deploy_config::{Config, DeployArgs};
use crate::error::ClientError;

/// Trait defining the pipeline client capability
pub trait PipelineClient: Send + Sync {
    /// Install the default self-update pipeline on the cluster
    fn set_default_pipeline(&self, args: &DeployArgs, config: &Config) -> Result<(), ClientError>;

    fn can_connect(&self) -> Result<bool, ClientError>;

    fn cleanup(&self) -> Result<(), ClientError>;
}

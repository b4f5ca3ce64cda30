//! Release deployment capability

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

/// A VM of the deployed release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub ip: String,
    pub state: String,
}

/// Trait defining the deployment manager capability.
///
/// The manager's own state travels as an opaque document: it is handed the
/// state from the last run and returns the state to persist.
pub trait DeploymentManager: Send + Sync {
    fn deploy(&self, state: &[u8], detach: bool) -> Result<Vec<u8>, ClientError>;

    fn delete(&self, state: &[u8]) -> Result<Vec<u8>, ClientError>;

    fn instances(&self) -> Result<Vec<Instance>, ClientError>;

    fn cleanup(&self) -> Result<(), ClientError>;
}

//! Infrastructure provisioning capability

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output name carrying the director's public address
pub const DIRECTOR_PUBLIC_IP: &str = "director_public_ip";

/// Named outputs of an applied infrastructure plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraMetadata {
    pub outputs: BTreeMap<String, String>,
}

impl InfraMetadata {
    pub fn with_output(mut self, name: &str, value: &str) -> Self {
        self.outputs.insert(name.to_string(), value.to_string());
        self
    }

    /// Look up a required output
    pub fn get(&self, name: &str) -> Result<&str, ClientError> {
        self.outputs
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ClientError::failed("provisioner", "output", format!("missing output {}", name)))
    }
}

/// Trait defining the infrastructure provisioning capability
pub trait Provisioner: Send + Sync {
    /// Converge infrastructure; `dry_run` only plans
    fn apply(&self, dry_run: bool) -> Result<(), ClientError>;

    fn destroy(&self) -> Result<(), ClientError>;

    fn output(&self) -> Result<InfraMetadata, ClientError>;

    /// Release local working files
    fn cleanup(&self) -> Result<(), ClientError>;
}

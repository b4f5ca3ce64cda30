//! Deployment Configuration
//!
//! The persisted [`Config`] document describing one deployment, and the
//! [`ConfigClient`] capability that loads, seeds and updates it alongside
//! the deployment's other state assets.

pub mod args;
pub mod fake_client;
pub mod store_client;

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

pub use self::args::DeployArgs;
pub use self::fake_client::FakeConfigClient;
pub use self::store_client::StoreConfigClient;

/// Key of the config document inside the config container
pub const CONFIG_KEY: &str = "config.json";

/// Asset holding the deployment manager's state
pub const DIRECTOR_STATE_ASSET: &str = "director-state.json";

/// Persisted configuration of one deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: String,
    pub deployment: String,
    pub region: String,
    pub config_bucket: String,
    pub domain: String,
    pub tls_cert: String,
    pub tls_key: String,
    pub worker_count: u32,
    pub worker_size: String,
    pub web_size: String,
    pub db_instance_class: String,
    pub restrict_ips: String,
    /// Filled from provisioning outputs after the first apply
    pub director_public_ip: String,
}

impl Config {
    /// Initial document for a project, derived from validated deploy args
    pub fn from_args(project: &str, config_bucket: &str, args: &DeployArgs) -> Result<Self, ClientError> {
        args.validate()?;
        let db_instance_class = args
            .db_instance_class()
            .ok_or_else(|| ClientError::InvalidArgs(format!("unknown DB size: `{}`", args.db_size)))?;
        Ok(Self {
            project: project.to_string(),
            deployment: format!("ci-deployer-{}", project),
            region: args.aws_region.clone(),
            config_bucket: config_bucket.to_string(),
            domain: args.domain.clone(),
            tls_cert: args.tls_cert.clone(),
            tls_key: args.tls_key.clone(),
            worker_count: args.worker_count,
            worker_size: args.worker_size.clone(),
            web_size: args.web_size.clone(),
            db_instance_class: db_instance_class.to_string(),
            restrict_ips: args.restrict_ips.clone(),
            director_public_ip: String::new(),
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ClientError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ClientError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Trait defining the config persistence capability
pub trait ConfigClient: Send + Sync {
    /// Read the stored config document
    fn load(&self) -> Result<Config, ClientError>;

    /// Replace the stored config document
    fn update(&self, config: &Config) -> Result<(), ClientError>;

    /// Return the stored config, seeding it from `args` on first use.
    /// The flag is true only when this call created it.
    fn load_or_create(&self, args: &DeployArgs) -> Result<(Config, bool), ClientError>;

    fn store_asset(&self, filename: &str, contents: &[u8]) -> Result<(), ClientError>;

    fn load_asset(&self, filename: &str) -> Result<Vec<u8>, ClientError>;

    fn delete_asset(&self, filename: &str) -> Result<(), ClientError>;

    /// Destroy the config container with every asset in it
    fn delete_all(&self, config: &Config) -> Result<(), ClientError>;

    fn has_asset(&self, filename: &str) -> Result<bool, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args_derives_document() {
        let args = DeployArgs {
            aws_region: "eu-west-2".to_string(),
            db_size: "large".to_string(),
            worker_count: 3,
            ..DeployArgs::default()
        };
        let config = Config::from_args("alpha", "alpha-config", &args).unwrap();
        assert_eq!(config.deployment, "ci-deployer-alpha");
        assert_eq!(config.region, "eu-west-2");
        assert_eq!(config.db_instance_class, "db.m4.large");
        assert_eq!(config.worker_count, 3);
        assert!(config.director_public_ip.is_empty());
    }

    #[test]
    fn test_from_args_rejects_invalid() {
        let args = DeployArgs {
            worker_count: 0,
            ..DeployArgs::default()
        };
        assert!(matches!(
            Config::from_args("alpha", "alpha-config", &args),
            Err(ClientError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_json_document() {
        let config = Config::from_args("alpha", "alpha-config", &DeployArgs::default()).unwrap();
        let parsed = Config::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);

        // Missing fields fall back to defaults
        let sparse = Config::from_json(b"{\"project\":\"beta\"}").unwrap();
        assert_eq!(sparse.project, "beta");
        assert_eq!(sparse.worker_count, 0);

        assert!(matches!(Config::from_json(b"not json"), Err(ClientError::Document(_))));
    }
}

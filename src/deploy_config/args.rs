//! Deploy command arguments and their cross-field validation

use crate::error::ClientError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Permitted worker sizes
pub const WORKER_SIZES: &[&str] = &["medium", "large", "xlarge", "2xlarge", "4xlarge", "10xlarge", "16xlarge"];

/// Permitted web node sizes
pub const WEB_SIZES: &[&str] = &["small", "medium", "large", "xlarge", "2xlarge"];

lazy_static! {
    /// Database sizes mapped to their instance classes
    pub static ref DB_SIZES: BTreeMap<&'static str, &'static str> = {
        let mut sizes = BTreeMap::new();
        sizes.insert("small", "db.t2.small");
        sizes.insert("medium", "db.t2.medium");
        sizes.insert("large", "db.m4.large");
        sizes.insert("xlarge", "db.m4.xlarge");
        sizes.insert("2xlarge", "db.m4.2xlarge");
        sizes.insert("4xlarge", "db.m4.4xlarge");
        sizes
    };
}

/// Arguments passed to the deploy command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployArgs {
    pub iaas: String,
    pub aws_region: String,
    pub domain: String,
    pub tls_cert: String,
    pub tls_key: String,
    pub worker_count: u32,
    pub worker_size: String,
    pub web_size: String,
    pub self_update: bool,
    pub db_size: String,
    /// True when the db size was given explicitly rather than defaulted
    pub db_size_is_set: bool,
    pub restrict_ips: String,
}

impl Default for DeployArgs {
    fn default() -> Self {
        Self {
            iaas: "AWS".to_string(),
            aws_region: "eu-west-1".to_string(),
            domain: String::new(),
            tls_cert: String::new(),
            tls_key: String::new(),
            worker_count: 1,
            worker_size: "xlarge".to_string(),
            web_size: "small".to_string(),
            self_update: false,
            db_size: "small".to_string(),
            db_size_is_set: false,
            restrict_ips: String::new(),
        }
    }
}

impl DeployArgs {
    /// Check flag interdependencies and size names
    pub fn validate(&self) -> Result<(), ClientError> {
        self.validate_cert_fields()?;
        self.validate_worker_fields()?;
        self.validate_web_fields()?;
        self.validate_db_fields()
    }

    /// Instance class for the configured db size
    pub fn db_instance_class(&self) -> Option<&'static str> {
        DB_SIZES.get(self.db_size.as_str()).copied()
    }

    fn validate_cert_fields(&self) -> Result<(), ClientError> {
        if !self.tls_key.is_empty() && self.tls_cert.is_empty() {
            return Err(ClientError::InvalidArgs(
                "--tls-key requires --tls-cert to also be provided".to_string(),
            ));
        }
        if !self.tls_cert.is_empty() && self.tls_key.is_empty() {
            return Err(ClientError::InvalidArgs(
                "--tls-cert requires --tls-key to also be provided".to_string(),
            ));
        }
        if (!self.tls_key.is_empty() || !self.tls_cert.is_empty()) && self.domain.is_empty() {
            return Err(ClientError::InvalidArgs(
                "custom certificates require --domain to be provided".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_worker_fields(&self) -> Result<(), ClientError> {
        if self.worker_count < 1 {
            return Err(ClientError::InvalidArgs("minimum of workers is 1".to_string()));
        }
        if !WORKER_SIZES.contains(&self.worker_size.as_str()) {
            return Err(ClientError::InvalidArgs(format!(
                "unknown worker size: `{}`. Valid sizes are: {}",
                self.worker_size,
                WORKER_SIZES.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_web_fields(&self) -> Result<(), ClientError> {
        if !WEB_SIZES.contains(&self.web_size.as_str()) {
            return Err(ClientError::InvalidArgs(format!(
                "unknown web node size: `{}`. Valid sizes are: {}",
                self.web_size,
                WEB_SIZES.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_db_fields(&self) -> Result<(), ClientError> {
        if self.db_instance_class().is_none() {
            let valid: Vec<&str> = DB_SIZES.keys().copied().collect();
            return Err(ClientError::InvalidArgs(format!(
                "unknown DB size: `{}`. Valid sizes are: {}",
                self.db_size,
                valid.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(args: &DeployArgs) -> String {
        args.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_defaults_are_valid() {
        DeployArgs::default().validate().unwrap();
    }

    #[test]
    fn test_tls_fields_come_together() {
        let key_only = DeployArgs {
            tls_key: "key".to_string(),
            domain: "ci.example.com".to_string(),
            ..DeployArgs::default()
        };
        assert!(message(&key_only).contains("--tls-key requires --tls-cert"));

        let cert_only = DeployArgs {
            tls_cert: "cert".to_string(),
            domain: "ci.example.com".to_string(),
            ..DeployArgs::default()
        };
        assert!(message(&cert_only).contains("--tls-cert requires --tls-key"));

        let no_domain = DeployArgs {
            tls_cert: "cert".to_string(),
            tls_key: "key".to_string(),
            ..DeployArgs::default()
        };
        assert!(message(&no_domain).contains("require --domain"));

        let complete = DeployArgs {
            tls_cert: "cert".to_string(),
            tls_key: "key".to_string(),
            domain: "ci.example.com".to_string(),
            ..DeployArgs::default()
        };
        complete.validate().unwrap();
    }

    #[test]
    fn test_worker_fields() {
        let none = DeployArgs {
            worker_count: 0,
            ..DeployArgs::default()
        };
        assert!(message(&none).contains("minimum of workers is 1"));

        for size in WORKER_SIZES {
            let args = DeployArgs {
                worker_size: size.to_string(),
                ..DeployArgs::default()
            };
            args.validate().unwrap();
        }

        let bad = DeployArgs {
            worker_size: "small".to_string(),
            ..DeployArgs::default()
        };
        assert!(message(&bad).contains("unknown worker size: `small`"));
    }

    #[test]
    fn test_web_size() {
        let bad = DeployArgs {
            web_size: "4xlarge".to_string(),
            ..DeployArgs::default()
        };
        assert!(message(&bad).contains("unknown web node size"));
    }

    #[test]
    fn test_db_sizes_map_to_instance_classes() {
        let args = DeployArgs {
            db_size: "2xlarge".to_string(),
            ..DeployArgs::default()
        };
        assert_eq!(args.db_instance_class(), Some("db.m4.2xlarge"));
        assert_eq!(DeployArgs::default().db_instance_class(), Some("db.t2.small"));

        let bad = DeployArgs {
            db_size: "tiny".to_string(),
            ..DeployArgs::default()
        };
        assert_eq!(bad.db_instance_class(), None);
        assert!(message(&bad).contains("unknown DB size: `tiny`"));
    }
}

//! Orchestration services over the state store and collaborator capabilities

pub mod deploy_service;

pub use self::deploy_service::{DeployOutcome, DeployService};

//! Deploy and destroy workflows over the collaborator capabilities

use crate::clients::provisioner::DIRECTOR_PUBLIC_IP;
use crate::clients::{DeploymentManager, PipelineClient, Provisioner};
use crate::deploy_config::{Config, ConfigClient, DeployArgs, DIRECTOR_STATE_ASSET};
use crate::error::ClientError;
use log::{debug, info, warn};
use std::sync::Arc;

/// Result of a deploy run
#[derive(Debug, Clone, PartialEq)]
pub struct DeployOutcome {
    pub config: Config,
    /// True when this run seeded the config
    pub config_created: bool,
}

/// Service that sequences the collaborators for one project
pub struct DeployService {
    config_client: Arc<dyn ConfigClient>,
    provisioner: Arc<dyn Provisioner>,
    deployment: Arc<dyn DeploymentManager>,
    pipeline: Arc<dyn PipelineClient>,
}

impl DeployService {
    /// Create a new deploy service with injected collaborators
    pub fn new(
        config_client: Arc<dyn ConfigClient>,
        provisioner: Arc<dyn Provisioner>,
        deployment: Arc<dyn DeploymentManager>,
        pipeline: Arc<dyn PipelineClient>,
    ) -> Self {
        Self {
            config_client,
            provisioner,
            deployment,
            pipeline,
        }
    }

    /// Seed or load config, converge infrastructure, deploy the release and
    /// install the default pipeline. Client cleanup runs whatever happens.
    pub fn deploy(&self, args: &DeployArgs, detach: bool) -> Result<DeployOutcome, ClientError> {
        let result = self.run_deploy(args, detach);
        Self::finish(result, self.cleanup())
    }

    /// Delete the release, then the infrastructure, then every stored asset
    pub fn destroy(&self) -> Result<(), ClientError> {
        let result = self.run_destroy();
        Self::finish(result, self.cleanup())
    }

    fn run_deploy(&self, args: &DeployArgs, detach: bool) -> Result<DeployOutcome, ClientError> {
        args.validate()?;
        let (mut config, config_created) = self.config_client.load_or_create(args)?;
        if config_created {
            info!("Initialised config for deployment {}", config.deployment);
        } else {
            debug!("Reusing config for deployment {}", config.deployment);
        }

        self.provisioner.apply(false)?;
        let metadata = self.provisioner.output()?;
        config.director_public_ip = metadata.get(DIRECTOR_PUBLIC_IP)?.to_string();
        self.config_client.update(&config)?;

        let state = self.load_director_state()?;
        let new_state = self.deployment.deploy(&state, detach)?;
        self.config_client.store_asset(DIRECTOR_STATE_ASSET, &new_state)?;

        self.pipeline.set_default_pipeline(args, &config)?;
        info!("Deployment {} is up at {}", config.deployment, config.director_public_ip);
        Ok(DeployOutcome { config, config_created })
    }

    fn run_destroy(&self) -> Result<(), ClientError> {
        let config = self.config_client.load()?;
        info!("Destroying deployment {}", config.deployment);

        let state = self.load_director_state()?;
        let new_state = self.deployment.delete(&state)?;
        // Kept until the container goes so a failed destroy can be retried
        self.config_client.store_asset(DIRECTOR_STATE_ASSET, &new_state)?;

        self.provisioner.destroy()?;
        self.config_client.delete_all(&config)?;
        info!("Deployment {} destroyed", config.deployment);
        Ok(())
    }

    fn load_director_state(&self) -> Result<Vec<u8>, ClientError> {
        if self.config_client.has_asset(DIRECTOR_STATE_ASSET)? {
            self.config_client.load_asset(DIRECTOR_STATE_ASSET)
        } else {
            Ok(Vec::new())
        }
    }

    /// Run every client's cleanup, returning the first failure
    fn cleanup(&self) -> Result<(), ClientError> {
        let results = [
            self.provisioner.cleanup(),
            self.deployment.cleanup(),
            self.pipeline.cleanup(),
        ];
        let mut first = None;
        for result in results {
            if let Err(e) = result {
                warn!("Client cleanup failed: {}", e);
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn finish<T>(result: Result<T, ClientError>, cleanup: Result<(), ClientError>) -> Result<T, ClientError> {
        let value = result?;
        cleanup?;
        Ok(value)
    }
}

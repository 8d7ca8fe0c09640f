use crate::config::{ArgoConfig, ValidationError};
use crate::directory::{Instance, InstanceDirectory};
use crate::errors::GatewayError;
use crate::retry::RetryConfig;
use crate::token::TokenResolver;
use argo_client::ArgoClient;
use std::sync::Arc;

/// Where created projects and applications deploy, and how they are labeled.
#[derive(Clone, Debug, PartialEq)]
pub struct AppDefaults {
    pub destination_server: String,
    pub label_key: String,
}

/// Everything a request handler needs. Cheap to clone; all of it is shared
/// and read-only.
#[derive(Clone)]
pub struct GatewayState {
    pub directory: Arc<InstanceDirectory>,
    pub client: Arc<dyn ArgoClient>,
    pub tokens: TokenResolver,
    pub deletion_poll: RetryConfig,
    pub defaults: AppDefaults,
}

impl GatewayState {
    pub fn new(config: &ArgoConfig, client: Arc<dyn ArgoClient>) -> Result<Self, ValidationError> {
        config.validate()?;
        let directory = InstanceDirectory::from_config(config.instances.clone())?;

        Ok(GatewayState {
            directory: Arc::new(directory),
            tokens: TokenResolver::new(
                client.clone(),
                config.username.clone(),
                config.password.clone(),
            ),
            client,
            deletion_poll: RetryConfig::new(config.wait_cycles, config.poll_delay()),
            defaults: AppDefaults {
                destination_server: config.destination_server.clone(),
                label_key: config.label_key.clone(),
            },
        })
    }

    /// Resolves an instance by name together with a token for it.
    pub async fn connect(&self, instance_name: &str) -> Result<(&Instance, String), GatewayError> {
        let instance = self.directory.resolve(instance_name)?;
        let token = self.tokens.resolve_token(instance).await?;
        Ok((instance, token))
    }
}

pub mod api;
pub mod config;
pub mod deletion;
pub mod directory;
pub mod errors;
pub mod metrics_defs;
pub mod operations;
pub mod retry;
pub mod state;
pub mod sync;
pub mod token;

#[cfg(test)]
mod testutils;

use argo_client::{ArgoError, ClientSettings, HttpArgoClient};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum ArgoApiError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Validation(#[from] config::ValidationError),
    #[error("could not build argocd client: {0}")]
    Client(#[from] ArgoError),
}

/// Serves the gateway API and the admin probes until either listener fails.
pub async fn run(config: config::Config) -> Result<(), ArgoApiError> {
    config.validate()?;

    let client = HttpArgoClient::new(ClientSettings {
        request_timeout: config.argocd.request_timeout(),
        insecure_skip_tls_verify: config.argocd.insecure_skip_tls_verify,
    })?;
    let state = state::GatewayState::new(&config.argocd, Arc::new(client))?;
    tracing::info!(instances = state.directory.len(), "Loaded ArgoCD instances");

    let directory = state.directory.clone();
    let admin_service = AdminService::<_, ArgoApiError>::new(move || !directory.is_empty());

    let api_task = api::serve(&config.listener, state, &config.mount_path);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

use crate::directory::Instance;
use crate::errors::GatewayError;
use crate::metrics_defs::ARGO_SYNC_APPS;
use crate::state::GatewayState;
use argo_client::ApplicationRef;
use serde::{Deserialize, Serialize};
use shared::counter;

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub app_selector: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncedApp {
    pub instance_name: String,
    pub app_name: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct SyncResult {
    pub synced: Vec<SyncedApp>,
}

/// Triggers a sync of every application matching `selector` on every
/// instance.
///
/// A failure does not stop the remaining instances or applications from
/// being synced; the first failure in directory order is returned once all
/// of them were attempted.
pub async fn sync_all(state: &GatewayState, selector: &str) -> Result<SyncResult, GatewayError> {
    let mut result = SyncResult::default();
    let mut first_error = None;

    for instance in state.directory.iter() {
        if let Err(e) = sync_instance(state, instance, selector, &mut result).await {
            tracing::warn!(instance = %instance.name, selector, error = %e, "Sync failed");
            first_error.get_or_insert(e);
        }
    }

    counter!(ARGO_SYNC_APPS).increment(result.synced.len() as u64);

    match first_error {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

async fn sync_instance(
    state: &GatewayState,
    instance: &Instance,
    selector: &str,
    result: &mut SyncResult,
) -> Result<(), GatewayError> {
    let token = state.tokens.resolve_token(instance).await?;
    let apps = state
        .client
        .get_app(
            &instance.base_url,
            &token,
            &ApplicationRef::Selector(selector.to_string()),
        )
        .await?;

    let mut first_error = None;
    for app_name in apps.item_names() {
        match state
            .client
            .sync_app(&instance.base_url, &token, &app_name)
            .await
        {
            Ok(_) => {
                tracing::debug!(instance = %instance.name, app = %app_name, "Sync triggered");
                result.synced.push(SyncedApp {
                    instance_name: instance.name.clone(),
                    app_name,
                });
            }
            Err(e) => {
                first_error.get_or_insert(GatewayError::from(e));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

use crate::directory::Instance;
use crate::errors::GatewayError;
use crate::state::GatewayState;
use argo_client::{AppData, ApplicationRef, ApplicationSpec, Destination, ProjectSpec};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

/// An application located by a cross-instance lookup.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoundApplication {
    pub instance_name: String,
    pub data: AppData,
}

/// Looks `app` up on every instance at once.
///
/// Instances that fail to answer are logged and left out. The result follows
/// directory order regardless of which instance answered first.
pub async fn find(state: &GatewayState, app: ApplicationRef) -> Vec<FoundApplication> {
    let mut join_set = JoinSet::new();

    for (index, instance) in state.directory.iter().enumerate() {
        let state = state.clone();
        let instance = instance.clone();
        let app = app.clone();

        join_set.spawn(async move {
            let result = fetch_from(&state, &instance, &app).await;
            (index, instance.name, result)
        });
    }

    let mut found = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, instance_name, Ok(data))) => {
                if data.matches_any() {
                    found.push((index, FoundApplication { instance_name, data }));
                }
            }
            Ok((_, instance_name, Err(e))) => {
                tracing::warn!(instance = %instance_name, app = app.as_str(), error = %e, "Lookup failed, skipping instance");
            }
            Err(e) => tracing::error!("Task panicked: {}", e),
        }
    }

    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, app)| app).collect()
}

async fn fetch_from(
    state: &GatewayState,
    instance: &Instance,
    app: &ApplicationRef,
) -> Result<AppData, GatewayError> {
    let token = state.tokens.resolve_token(instance).await?;
    Ok(state.client.get_app(&instance.base_url, &token, app).await?)
}

/// Instance-scoped fetch; ArgoCD's document is passed through untouched.
pub async fn get(
    state: &GatewayState,
    instance: &Instance,
    app: &ApplicationRef,
    token: &str,
) -> Result<AppData, GatewayError> {
    tracing::debug!(instance = %instance.name, app = app.as_str(), "Fetching application");
    Ok(state.client.get_app(&instance.base_url, token, app).await?)
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Name of the instance to create on
    pub cluster_name: String,
    pub namespace: String,
    pub project_name: String,
    pub app_name: String,
    pub label_value: String,
    pub source_repo: String,
    pub source_path: String,
}

/// Creates the project, then the application inside it.
///
/// A failed project creation aborts before the application is attempted. A
/// failed application creation leaves the new project in place.
pub async fn create(
    state: &GatewayState,
    instance: &Instance,
    token: &str,
    request: &CreateRequest,
) -> Result<AppData, GatewayError> {
    let destination = Destination {
        server: state.defaults.destination_server.clone(),
        namespace: request.namespace.clone(),
    };

    let project = ProjectSpec::new(
        &request.project_name,
        &request.source_repo,
        destination.clone(),
    );
    state
        .client
        .create_project(&instance.base_url, token, &project)
        .await
        .inspect_err(|e| {
            tracing::warn!(instance = %instance.name, project = %request.project_name, error = %e, "Project creation failed");
        })?;

    let application = ApplicationSpec::new(
        &request.app_name,
        &request.project_name,
        (state.defaults.label_key.as_str(), request.label_value.as_str()),
        &request.source_repo,
        &request.source_path,
        destination,
    );
    let created = state
        .client
        .create_application(&instance.base_url, token, &application)
        .await
        .inspect_err(|e| {
            tracing::warn!(instance = %instance.name, app = %request.app_name, error = %e, "Application creation failed, project left in place");
        })?;

    tracing::info!(
        instance = %instance.name,
        project = %request.project_name,
        app = %request.app_name,
        "Created project and application"
    );
    Ok(created)
}

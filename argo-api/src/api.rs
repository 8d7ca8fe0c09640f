use crate::ArgoApiError;
use crate::config::Listener as ListenerConfig;
use crate::deletion::{self, AbortedDeletion};
use crate::errors::GatewayError;
use crate::operations::{self, CreateRequest, FoundApplication};
use crate::state::GatewayState;
use crate::sync::{self, SyncRequest, SyncResult};
use argo_client::{AppData, ApplicationRef};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use tokio::net::TcpListener;

pub async fn serve(
    listener: &ListenerConfig,
    state: GatewayState,
    mount_path: &str,
) -> Result<(), ArgoApiError> {
    let app = router(state, mount_path);

    let addr = format!("{}:{}", listener.host, listener.port);
    tracing::info!(%addr, mount_path, "Serving gateway API");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// All API routes, nested under `mount_path` unless it is the root.
pub fn router(state: GatewayState, mount_path: &str) -> Router {
    let routes = Router::new()
        .route("/find/name/{app_name}", get(find_by_name))
        .route("/find/selector/{selector}", get(find_by_selector))
        .route(
            "/argoInstance/{instance_name}/applications/name/{app_name}",
            get(get_by_name),
        )
        .route(
            "/argoInstance/{instance_name}/applications/selector/{selector}",
            get(get_by_selector),
        )
        .route(
            "/argoInstance/{instance_name}/applications/{app_name}",
            delete(delete_application),
        )
        .route("/createArgo", post(create))
        .route("/sync", post(sync_apps))
        .with_state(state);

    match mount_path.trim_end_matches('/') {
        "" => routes,
        prefix => Router::new().nest(prefix, routes),
    }
}

async fn find_by_name(
    State(state): State<GatewayState>,
    Path(app_name): Path<String>,
) -> Json<Vec<FoundApplication>> {
    Json(operations::find(&state, ApplicationRef::Name(app_name)).await)
}

async fn find_by_selector(
    State(state): State<GatewayState>,
    Path(selector): Path<String>,
) -> Json<Vec<FoundApplication>> {
    Json(operations::find(&state, ApplicationRef::Selector(selector)).await)
}

async fn get_by_name(
    State(state): State<GatewayState>,
    Path((instance_name, app_name)): Path<(String, String)>,
) -> Result<Json<AppData>, GatewayError> {
    get_scoped(&state, &instance_name, ApplicationRef::Name(app_name)).await
}

async fn get_by_selector(
    State(state): State<GatewayState>,
    Path((instance_name, selector)): Path<(String, String)>,
) -> Result<Json<AppData>, GatewayError> {
    get_scoped(&state, &instance_name, ApplicationRef::Selector(selector)).await
}

async fn get_scoped(
    state: &GatewayState,
    instance_name: &str,
    app: ApplicationRef,
) -> Result<Json<AppData>, GatewayError> {
    let (instance, token) = state.connect(instance_name).await?;
    operations::get(state, instance, &app, &token)
        .await
        .map(Json)
}

async fn create(
    State(state): State<GatewayState>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<AppData>, GatewayError> {
    let (instance, token) = state.connect(&request.cluster_name).await?;
    operations::create(&state, instance, &token, &request)
        .await
        .map(Json)
}

async fn sync_apps(
    State(state): State<GatewayState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResult>, GatewayError> {
    sync::sync_all(&state, &request.app_selector)
        .await
        .map(Json)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DeleteParams {
    /// Defaults to the application name
    project_name: Option<String>,
}

async fn delete_application(
    State(state): State<GatewayState>,
    Path((instance_name, app_name)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Response {
    let project_name = params.project_name.unwrap_or_else(|| app_name.clone());
    tracing::info!(
        instance = %instance_name,
        app = %app_name,
        project = %project_name,
        "Deleting application"
    );

    match deletion::delete_application(&state, &instance_name, &app_name, &project_name).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            tracing::warn!(instance = %instance_name, app = %app_name, error = %err, "Deletion aborted");
            (err.status(), Json(AbortedDeletion::from(&err))).into_response()
        }
    }
}

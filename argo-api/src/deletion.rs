//! Application and project deletion.
//!
//! ArgoCD accepts an application delete long before the application is
//! actually gone, so a delete is followed by bounded polling until the
//! application record disappears. Only then, or when the application did not
//! exist in the first place, is the owning project deleted.
//!
//! ```text
//! delete app ──▶ not found ──────────────────────────▶ delete project
//!            ├─▶ rejected ───────────────────────────▶ skip project
//!            └─▶ accepted ──▶ poll ──▶ gone ─────────▶ delete project
//!                                  └─▶ pending delete ▶ skip project
//! ```
//!
//! Failures past instance and token resolution never fail the request; they
//! are reported in the two outcomes of [`DeletionResponse`].

use crate::directory::Instance;
use crate::errors::{ErrorBody, GatewayError};
use crate::metrics_defs::{ARGO_DELETE_DURATION, ARGO_DELETE_PENDING, ARGO_DELETE_POLL_ATTEMPTS};
use crate::retry::{Attempt, RetryConfig, RetryOutcome, retry_with_fixed_delay};
use crate::state::GatewayState;
use argo_client::{ApplicationRef, ArgoClient};
use serde::Serialize;
use shared::{counter, histogram};
use std::time::Instant;
use tracing::{info, warn};

pub const APP_DELETED: &str = "application is deleted successfully";
pub const APP_NOT_FOUND: &str = "application not found";
pub const APP_DELETE_REJECTED: &str = "error with deleteing argo app";
pub const APP_PENDING_DELETE: &str = "application pending delete";
pub const APP_DATA_ERROR: &str = "error getting app data";
pub const PROJECT_DELETED: &str = "project deleted successfully";
pub const PROJECT_DELETE_FAILED: &str = "error deleting argo project";
pub const PROJECT_SKIPPED_PENDING: &str = "skipping project deletion due to app deletion pending";
pub const PROJECT_SKIPPED_APP_ERROR: &str =
    "skipping project deletion due to erro deleting argo app";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DeletionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl DeletionOutcome {
    pub fn success<M: Into<String>>(message: M) -> Self {
        DeletionOutcome {
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed<M: Into<String>>(message: M) -> Self {
        DeletionOutcome {
            status: OutcomeStatus::Failed,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResponse {
    pub argo_delete_app_resp: DeletionOutcome,
    pub argo_delete_project_resp: DeletionOutcome,
}

/// Body for a deletion that never reached ArgoCD: the usual error fields
/// plus both outcomes, failed with the same message.
#[derive(Serialize, Debug, PartialEq)]
pub struct AbortedDeletion {
    #[serde(flatten)]
    pub error: ErrorBody,
    #[serde(flatten)]
    pub outcomes: DeletionResponse,
}

impl From<&GatewayError> for AbortedDeletion {
    fn from(err: &GatewayError) -> Self {
        AbortedDeletion {
            error: ErrorBody::from(err),
            outcomes: DeletionResponse {
                argo_delete_app_resp: DeletionOutcome::failed(err.message()),
                argo_delete_project_resp: DeletionOutcome::failed(err.message()),
            },
        }
    }
}

/// Answer to the delete call itself.
#[derive(Debug, PartialEq)]
enum AppDeletion {
    /// The call failed; ArgoCD does not know the application.
    Absent { message: String },
    /// ArgoCD refused to delete, the application is still there.
    Rejected,
    Accepted,
}

/// Where the application ended up once deletion and polling are over.
#[derive(Debug, PartialEq)]
pub(crate) enum AppResolution {
    NotFound { message: String },
    Rejected,
    Gone { attempts: u32 },
    /// Still present after the poll budget. `poll_error` holds the outcome
    /// recorded when the final poll itself failed; it is superseded by the
    /// pending-delete outcome.
    PendingDelete {
        attempts: u32,
        poll_error: Option<DeletionOutcome>,
    },
}

#[derive(Debug, PartialEq)]
enum ProjectDecision {
    Delete,
    SkipPendingDelete,
    SkipAppError,
}

impl AppResolution {
    fn outcome(&self) -> DeletionOutcome {
        match self {
            AppResolution::NotFound { message } => DeletionOutcome::failed(message.clone()),
            AppResolution::Rejected => DeletionOutcome::failed(APP_DELETE_REJECTED),
            AppResolution::Gone { .. } => DeletionOutcome::success(APP_DELETED),
            AppResolution::PendingDelete { .. } => DeletionOutcome::failed(APP_PENDING_DELETE),
        }
    }

    fn project_decision(&self) -> ProjectDecision {
        match self {
            AppResolution::PendingDelete { .. } => ProjectDecision::SkipPendingDelete,
            AppResolution::NotFound { .. } | AppResolution::Gone { .. } => ProjectDecision::Delete,
            AppResolution::Rejected => ProjectDecision::SkipAppError,
        }
    }
}

/// Deletes `app_name` on `instance_name`, then its project.
///
/// Returns an error only when the instance or its token cannot be resolved;
/// no ArgoCD call has been made in that case.
pub async fn delete_application(
    state: &GatewayState,
    instance_name: &str,
    app_name: &str,
    project_name: &str,
) -> Result<DeletionResponse, GatewayError> {
    let (instance, token) = state.connect(instance_name).await?;

    let start = Instant::now();
    let response = run_deletion(
        state.client.as_ref(),
        instance,
        &token,
        app_name,
        project_name,
        &state.deletion_poll,
    )
    .await;
    histogram!(ARGO_DELETE_DURATION).record(start.elapsed().as_secs_f64());

    Ok(response)
}

async fn run_deletion(
    client: &dyn ArgoClient,
    instance: &Instance,
    token: &str,
    app_name: &str,
    project_name: &str,
    poll: &RetryConfig,
) -> DeletionResponse {
    let resolution = match request_app_deletion(client, instance, token, app_name).await {
        AppDeletion::Absent { message } => AppResolution::NotFound { message },
        AppDeletion::Rejected => AppResolution::Rejected,
        AppDeletion::Accepted => poll_for_removal(client, instance, token, app_name, poll).await,
    };

    info!(
        instance = %instance.name,
        app = app_name,
        resolution = ?resolution,
        "Application deletion finished"
    );

    let project_outcome = match resolution.project_decision() {
        ProjectDecision::Delete => {
            match client
                .delete_project(&instance.base_url, token, project_name)
                .await
            {
                Ok(()) => DeletionOutcome::success(PROJECT_DELETED),
                Err(err) => {
                    warn!(instance = %instance.name, project = project_name, error = %err, "Project deletion failed");
                    DeletionOutcome::failed(err.message_or(PROJECT_DELETE_FAILED))
                }
            }
        }
        ProjectDecision::SkipPendingDelete => DeletionOutcome::failed(PROJECT_SKIPPED_PENDING),
        ProjectDecision::SkipAppError => DeletionOutcome::failed(PROJECT_SKIPPED_APP_ERROR),
    };

    DeletionResponse {
        argo_delete_app_resp: resolution.outcome(),
        argo_delete_project_resp: project_outcome,
    }
}

async fn request_app_deletion(
    client: &dyn ArgoClient,
    instance: &Instance,
    token: &str,
    app_name: &str,
) -> AppDeletion {
    match client.delete_app(&instance.base_url, token, app_name).await {
        Ok(true) => AppDeletion::Accepted,
        Ok(false) => AppDeletion::Rejected,
        Err(err) => {
            info!(instance = %instance.name, app = app_name, error = %err, "Application not deleted, treating as absent");
            AppDeletion::Absent {
                message: err.message_or(APP_NOT_FOUND),
            }
        }
    }
}

/// Polls until the application has no metadata left or the budget runs out.
pub(crate) async fn poll_for_removal(
    client: &dyn ArgoClient,
    instance: &Instance,
    token: &str,
    app_name: &str,
    poll: &RetryConfig,
) -> AppResolution {
    let app = &ApplicationRef::Name(app_name.to_string());

    let outcome = retry_with_fixed_delay(poll, "poll_app_deletion", move |_attempt| async move {
        client
            .get_app(&instance.base_url, token, app)
            .await
            .map(|data| {
                if data.has_metadata() {
                    Attempt::Retry
                } else {
                    Attempt::Done(())
                }
            })
    })
    .await;

    match outcome {
        RetryOutcome::Completed { attempts, .. } => {
            histogram!(ARGO_DELETE_POLL_ATTEMPTS).record(attempts as f64);
            AppResolution::Gone { attempts }
        }
        RetryOutcome::Exhausted {
            attempts,
            final_error,
        } => {
            histogram!(ARGO_DELETE_POLL_ATTEMPTS).record(attempts as f64);
            counter!(ARGO_DELETE_PENDING).increment(1);
            AppResolution::PendingDelete {
                attempts,
                poll_error: final_error.map(|_| DeletionOutcome::failed(APP_DATA_ERROR)),
            }
        }
    }
}

use argo_client::ArgoError;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

/// Message used when ArgoCD failed without saying why.
pub const GENERIC_UPSTREAM_MESSAGE: &str = "error communicating with argocd";

/// Failures that abort a gateway request with an HTTP error status.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("argo instance not found: {0}")]
    InstanceNotFound(String),

    #[error("authentication failed: {message}")]
    Authentication {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("{}", .0.message_or(GENERIC_UPSTREAM_MESSAGE))]
    Upstream(#[from] ArgoError),
}

impl GatewayError {
    /// Upstream status when ArgoCD provided one, 500 otherwise. A missing
    /// instance is reported as 500 as well.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InstanceNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Authentication { status, .. } => {
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            GatewayError::Upstream(err) => err.status_or_default(),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Body of every error response.
#[derive(Serialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl From<&GatewayError> for ErrorBody {
    fn from(err: &GatewayError) -> Self {
        ErrorBody {
            status: err.status().as_u16(),
            message: err.message(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

use http::StatusCode;
use std::fmt;

/// Broad category of an ArgoCD API failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgoErrorKind {
    /// The referenced application or project does not exist.
    NotFound,
    /// Login was refused or the bearer token was not accepted.
    Unauthorized,
    /// ArgoCD answered with any other non-success status.
    Rejected,
    /// The request never produced a response (connect, TLS, timeout).
    Transport,
    /// The response body could not be decoded.
    Decode,
}

impl fmt::Display for ArgoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgoErrorKind::NotFound => "not found",
            ArgoErrorKind::Unauthorized => "unauthorized",
            ArgoErrorKind::Rejected => "rejected",
            ArgoErrorKind::Transport => "transport error",
            ArgoErrorKind::Decode => "decode error",
        };
        f.write_str(name)
    }
}

/// Error returned by every [`crate::ArgoClient`] call.
///
/// The upstream status and message are optional because transport failures
/// have neither. Callers that need a concrete value go through
/// [`ArgoError::status_or_default`] and [`ArgoError::message_or`] so the
/// fallback lives in one place.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("argocd {kind}: {}", .message.as_deref().unwrap_or("no message"))]
pub struct ArgoError {
    pub kind: ArgoErrorKind,
    pub status: Option<StatusCode>,
    pub message: Option<String>,
}

impl ArgoError {
    pub fn new(kind: ArgoErrorKind, status: Option<StatusCode>, message: Option<String>) -> Self {
        ArgoError {
            kind,
            status,
            message,
        }
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        ArgoError::new(
            ArgoErrorKind::NotFound,
            Some(StatusCode::NOT_FOUND),
            Some(message.into()),
        )
    }

    pub fn rejected<M: Into<String>>(status: StatusCode, message: M) -> Self {
        ArgoError::new(ArgoErrorKind::Rejected, Some(status), Some(message.into()))
    }

    pub fn transport<M: Into<String>>(message: M) -> Self {
        ArgoError::new(ArgoErrorKind::Transport, None, Some(message.into()))
    }

    /// Classifies a non-success upstream status.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let kind = match status {
            StatusCode::NOT_FOUND => ArgoErrorKind::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArgoErrorKind::Unauthorized,
            _ => ArgoErrorKind::Rejected,
        };
        ArgoError::new(kind, Some(status), message)
    }

    pub fn status_or_default(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message_or(&self, default: &str) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => default.to_string(),
        }
    }
}

impl From<reqwest::Error> for ArgoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ArgoError::new(
                ArgoErrorKind::Decode,
                err.status(),
                Some(err.to_string()),
            );
        }

        match err.status() {
            Some(status) => ArgoError::from_status(status, Some(err.to_string())),
            None => ArgoError::transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks() {
        let err = ArgoError::new(ArgoErrorKind::Transport, None, None);
        assert_eq!(err.status_or_default(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message_or("generic"), "generic");

        // Empty upstream messages are as good as none
        let err = ArgoError::new(ArgoErrorKind::Rejected, None, Some(String::new()));
        assert_eq!(err.message_or("generic"), "generic");

        let err = ArgoError::rejected(StatusCode::BAD_REQUEST, "bad spec");
        assert_eq!(err.status_or_default(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message_or("generic"), "bad spec");
    }

    #[test]
    fn test_from_status() {
        assert_eq!(
            ArgoError::from_status(StatusCode::NOT_FOUND, None).kind,
            ArgoErrorKind::NotFound
        );
        assert_eq!(
            ArgoError::from_status(StatusCode::FORBIDDEN, None).kind,
            ArgoErrorKind::Unauthorized
        );
        assert_eq!(
            ArgoError::from_status(StatusCode::BAD_GATEWAY, None).kind,
            ArgoErrorKind::Rejected
        );
    }

    #[test]
    fn test_display() {
        let err = ArgoError::not_found("app not found");
        assert_eq!(err.to_string(), "argocd not found: app not found");

        let err = ArgoError::new(ArgoErrorKind::Transport, None, None);
        assert_eq!(err.to_string(), "argocd transport error: no message");
    }
}

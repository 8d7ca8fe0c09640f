use crate::error::ArgoError;
use crate::types::{AppData, ApplicationRef, ApplicationSpec, ProjectSpec};
use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Operations the gateway needs from a single ArgoCD instance.
///
/// Every call is addressed by the instance base URL so one client can serve
/// all configured instances.
#[async_trait]
pub trait ArgoClient: Send + Sync {
    /// Exchanges username/password for a session token.
    async fn login(&self, base_url: &Url, username: &str, password: &str)
    -> Result<String, ArgoError>;

    /// Fetches an application by name or the application list for a selector.
    /// A missing application is not an error: the returned document simply has
    /// no `metadata`.
    async fn get_app(
        &self,
        base_url: &Url,
        token: &str,
        app: &ApplicationRef,
    ) -> Result<AppData, ArgoError>;

    async fn create_project(
        &self,
        base_url: &Url,
        token: &str,
        project: &ProjectSpec,
    ) -> Result<AppData, ArgoError>;

    async fn create_application(
        &self,
        base_url: &Url,
        token: &str,
        application: &ApplicationSpec,
    ) -> Result<AppData, ArgoError>;

    /// Requests a cascading delete. `Ok(false)` means ArgoCD refused the
    /// deletion and the application is still present; an error means the
    /// application could not be found or reached.
    async fn delete_app(&self, base_url: &Url, token: &str, name: &str)
    -> Result<bool, ArgoError>;

    async fn delete_project(&self, base_url: &Url, token: &str, name: &str)
    -> Result<(), ArgoError>;

    async fn sync_app(&self, base_url: &Url, token: &str, name: &str)
    -> Result<AppData, ArgoError>;
}

/// Transport settings shared by every request of an [`HttpArgoClient`].
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            request_timeout: Duration::from_secs(30),
            insecure_skip_tls_verify: false,
        }
    }
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Serialize)]
struct ProjectCreateRequest<'a> {
    project: &'a ProjectSpec,
}

// ArgoCD reports failures as a gRPC-gateway status document.
#[derive(Deserialize)]
struct UpstreamErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`ArgoClient`] speaking the ArgoCD REST API over reqwest.
#[derive(Clone)]
pub struct HttpArgoClient {
    client: reqwest::Client,
}

impl HttpArgoClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ArgoError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .danger_accept_invalid_certs(settings.insecure_skip_tls_verify)
            .build()?;

        Ok(HttpArgoClient { client })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ArgoError> {
        let request = request.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending ArgoCD request");
        Ok(self.client.execute(request).await?)
    }
}

/// Appends path segments to the instance base URL, percent-encoding each one.
fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, ArgoError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| ArgoError::transport(format!("invalid ArgoCD base url: {base_url}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn error_from_response(response: reqwest::Response) -> ArgoError {
    let status = response.status();
    let message = response
        .json::<UpstreamErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message.or(body.error));
    ArgoError::from_status(status, message)
}

async fn read_app_data(response: reqwest::Response) -> Result<AppData, ArgoError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    Ok(response.json::<AppData>().await?)
}

#[async_trait]
impl ArgoClient for HttpArgoClient {
    async fn login(
        &self,
        base_url: &Url,
        username: &str,
        password: &str,
    ) -> Result<String, ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "session"])?;
        let response = self
            .send(
                self.client
                    .post(url)
                    .json(&SessionRequest { username, password }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json::<SessionResponse>().await?.token)
    }

    async fn get_app(
        &self,
        base_url: &Url,
        token: &str,
        app: &ApplicationRef,
    ) -> Result<AppData, ArgoError> {
        let request = match app {
            ApplicationRef::Name(name) => {
                let url = endpoint(base_url, &["api", "v1", "applications", name.as_str()])?;
                self.client.get(url)
            }
            ApplicationRef::Selector(selector) => {
                let url = endpoint(base_url, &["api", "v1", "applications"])?;
                self.client.get(url).query(&[("selector", selector.as_str())])
            }
        };

        let response = self.send(request.bearer_auth(token)).await?;

        // The not-found document is handed back so callers can observe that
        // the record no longer has metadata.
        if response.status() == StatusCode::NOT_FOUND {
            let body = response.bytes().await?;
            let data = serde_json::from_slice::<AppData>(&body).unwrap_or_else(|_| {
                AppData(serde_json::json!({
                    "message": String::from_utf8_lossy(&body),
                }))
            });
            return Ok(data);
        }

        read_app_data(response).await
    }

    async fn create_project(
        &self,
        base_url: &Url,
        token: &str,
        project: &ProjectSpec,
    ) -> Result<AppData, ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "projects"])?;
        let response = self
            .send(
                self.client
                    .post(url)
                    .bearer_auth(token)
                    .json(&ProjectCreateRequest { project }),
            )
            .await?;
        read_app_data(response).await
    }

    async fn create_application(
        &self,
        base_url: &Url,
        token: &str,
        application: &ApplicationSpec,
    ) -> Result<AppData, ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "applications"])?;
        let response = self
            .send(self.client.post(url).bearer_auth(token).json(application))
            .await?;
        read_app_data(response).await
    }

    async fn delete_app(&self, base_url: &Url, token: &str, name: &str) -> Result<bool, ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "applications", name])?;
        let response = self
            .send(
                self.client
                    .delete(url)
                    .query(&[("cascade", "true")])
                    .bearer_auth(token),
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(error_from_response(response).await);
        }

        let err = error_from_response(response).await;
        tracing::warn!(app = name, status = %status, error = %err, "ArgoCD rejected application deletion");
        Ok(false)
    }

    async fn delete_project(&self, base_url: &Url, token: &str, name: &str) -> Result<(), ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "projects", name])?;
        let response = self.send(self.client.delete(url).bearer_auth(token)).await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn sync_app(&self, base_url: &Url, token: &str, name: &str) -> Result<AppData, ArgoError> {
        let url = endpoint(base_url, &["api", "v1", "applications", name, "sync"])?;
        let response = self
            .send(
                self.client
                    .post(url)
                    .bearer_auth(token)
                    .json(&serde_json::json!({"prune": true})),
            )
            .await?;
        read_app_data(response).await
    }
}

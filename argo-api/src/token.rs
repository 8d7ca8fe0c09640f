use crate::directory::Instance;
use crate::errors::GatewayError;
use crate::metrics_defs::ARGO_LOGIN;
use argo_client::ArgoClient;
use shared::counter;
use std::sync::Arc;

/// Supplies the bearer token for an instance.
///
/// Tokens obtained by login are not cached: each request resolves its own.
#[derive(Clone)]
pub struct TokenResolver {
    client: Arc<dyn ArgoClient>,
    username: Option<String>,
    password: Option<String>,
}

impl TokenResolver {
    /// `username`/`password` are the directory-wide login used for instances
    /// that carry neither a static token nor their own credentials.
    pub fn new(
        client: Arc<dyn ArgoClient>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        TokenResolver {
            client,
            username,
            password,
        }
    }

    fn default_credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub async fn resolve_token(&self, instance: &Instance) -> Result<String, GatewayError> {
        if let Some(token) = &instance.token {
            return Ok(token.clone());
        }

        let (username, password) = instance
            .credentials()
            .or_else(|| self.default_credentials())
            .ok_or_else(|| GatewayError::Authentication {
                status: None,
                message: format!("no credentials configured for instance {}", instance.name),
            })?;

        counter!(ARGO_LOGIN).increment(1);
        tracing::debug!(instance = %instance.name, username, "Logging in to ArgoCD");

        self.client
            .login(&instance.base_url, username, password)
            .await
            .map_err(|err| {
                tracing::warn!(instance = %instance.name, error = %err, "ArgoCD login failed");
                GatewayError::Authentication {
                    status: err.status,
                    message: err.message_or("login failed"),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{Call, MockArgoClient, instance};
    use argo_client::ArgoError;
    use http::StatusCode;

    fn resolver(client: Arc<MockArgoClient>) -> TokenResolver {
        TokenResolver::new(client, Some("admin".into()), Some("secret".into()))
    }

    #[tokio::test]
    async fn test_static_token_skips_login() {
        let client = Arc::new(MockArgoClient::default());
        let prod = Instance::from(instance("prod", Some("tok2")));

        let token = resolver(client.clone()).resolve_token(&prod).await.unwrap();
        assert_eq!(token, "tok2");
        assert_eq!(client.logins(), 0);
    }

    #[tokio::test]
    async fn test_login_with_directory_credentials() {
        let client = Arc::new(MockArgoClient::default());
        let prod = Instance::from(instance("prod", None));

        let token = resolver(client.clone()).resolve_token(&prod).await.unwrap();
        assert_eq!(token, "tok1");
        assert_eq!(
            client.calls(),
            vec![Call::Login {
                host: "prod.argocd.test".into(),
                username: "admin".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_instance_credentials_take_precedence() {
        let client = Arc::new(MockArgoClient::default());
        let mut config = instance("prod", None);
        config.username = Some("prod-admin".into());
        config.password = Some("prod-secret".into());

        resolver(client.clone())
            .resolve_token(&Instance::from(config))
            .await
            .unwrap();
        assert_eq!(
            client.calls(),
            vec![Call::Login {
                host: "prod.argocd.test".into(),
                username: "prod-admin".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_login_failure_propagates_upstream_status() {
        let client = Arc::new(MockArgoClient {
            login: Err(ArgoError::from_status(
                StatusCode::UNAUTHORIZED,
                Some("Invalid username or password".into()),
            )),
            ..Default::default()
        });
        let prod = Instance::from(instance("prod", None));

        let err = resolver(client).resolve_token(&prod).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Authentication {
                status: Some(StatusCode::UNAUTHORIZED),
                message: "Invalid username or password".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = Arc::new(MockArgoClient::default());
        let prod = Instance::from(instance("prod", None));

        let err = TokenResolver::new(client.clone(), Some("admin".into()), None)
            .resolve_token(&prod)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Authentication { status: None, .. }));
        assert_eq!(client.logins(), 0);
    }
}

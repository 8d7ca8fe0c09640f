use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty instance name")]
    EmptyInstanceName,

    #[error("Duplicate instance name: {0}")]
    DuplicateInstance(String),

    #[error("wait_cycles must be at least 1")]
    InvalidWaitCycles,

    #[error("Mount path must start with '/': {0}")]
    InvalidMountPath(String),
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for the gateway API
    pub listener: Listener,
    /// Admin listener serving health and readiness probes
    pub admin_listener: Listener,
    /// Prefix under which every API route is mounted
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    pub argocd: ArgoConfig,
}

fn default_mount_path() -> String {
    "/".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if !self.mount_path.starts_with('/') {
            return Err(ValidationError::InvalidMountPath(self.mount_path.clone()));
        }

        self.argocd.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Settings shared by all ArgoCD instances, plus the instance list itself.
#[derive(Clone, Deserialize, PartialEq)]
pub struct ArgoConfig {
    /// Directory-wide login, used for instances without their own credentials
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number of times a deleted application is polled before giving up
    #[serde(default = "default_wait_cycles")]
    pub wait_cycles: u32,
    #[serde(default = "default_poll_delay_secs")]
    pub poll_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    /// Cluster that created applications and projects deploy into
    #[serde(default = "default_destination_server")]
    pub destination_server: String,
    /// Label key carrying `labelValue` on created applications
    #[serde(default = "default_label_key")]
    pub label_key: String,
    pub instances: Vec<InstanceConfig>,
}

fn default_wait_cycles() -> u32 {
    5
}

fn default_poll_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_destination_server() -> String {
    "https://kubernetes.default.svc".into()
}

fn default_label_key() -> String {
    "app".into()
}

impl ArgoConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wait_cycles == 0 {
            return Err(ValidationError::InvalidWaitCycles);
        }

        let mut names = HashSet::new();
        for instance in &self.instances {
            if instance.name.is_empty() {
                return Err(ValidationError::EmptyInstanceName);
            }
            if !names.insert(&instance.name) {
                return Err(ValidationError::DuplicateInstance(instance.name.clone()));
            }
        }

        Ok(())
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for ArgoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoConfig")
            .field("username", &self.username)
            .field("wait_cycles", &self.wait_cycles)
            .field("poll_delay_secs", &self.poll_delay_secs)
            .field("instances", &self.instances)
            .finish_non_exhaustive()
    }
}

/// One ArgoCD instance
#[derive(Clone, Deserialize, PartialEq)]
pub struct InstanceConfig {
    pub name: String,
    /// Base URL of the ArgoCD API server
    pub url: Url,
    /// Static bearer token; when set no login is performed
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
listener:
    host: "0.0.0.0"
    port: 3000
admin_listener:
    host: "127.0.0.1"
    port: 3001
argocd:
    username: admin
    password: secret
    instances:
        - name: prod
          url: "https://argocd.prod.example.com"
          token: static-token
        - name: staging
          url: "https://argocd.staging.example.com/"
"#;

    fn base_config() -> Config {
        serde_yaml::from_str(VALID).unwrap()
    }

    #[test]
    fn test_parse_valid_config() {
        let config = base_config();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.mount_path, "/");
        assert_eq!(config.argocd.instances.len(), 2);
        assert_eq!(config.argocd.instances[0].token.as_deref(), Some("static-token"));
        assert_eq!(config.argocd.instances[1].token, None);

        // Defaults
        assert_eq!(config.argocd.wait_cycles, 5);
        assert_eq!(config.argocd.poll_delay(), Duration::from_secs(5));
        assert_eq!(config.argocd.request_timeout(), Duration::from_secs(30));
        assert!(!config.argocd.insecure_skip_tls_verify);
        assert_eq!(config.argocd.destination_server, "https://kubernetes.default.svc");
        assert_eq!(config.argocd.label_key, "app");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = base_config();
        config.admin_listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = base_config();
        config.argocd.wait_cycles = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidWaitCycles));

        let mut config = base_config();
        config.argocd.instances[1].name = "prod".into();
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateInstance("prod".into()))
        );

        let mut config = base_config();
        config.argocd.instances[0].name = "".into();
        assert_eq!(config.validate(), Err(ValidationError::EmptyInstanceName));

        let mut config = base_config();
        config.mount_path = "argo".into();
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidMountPath("argo".into()))
        );
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid instance URL
        assert!(
            serde_yaml::from_str::<ArgoConfig>(
                r#"
instances:
    - name: prod
      url: "not-a-url"
"#
            )
            .is_err()
        );

        // Missing instance list
        assert!(serde_yaml::from_str::<ArgoConfig>("username: admin").is_err());

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Listener>(r#"{host: "0.0.0.0", port: "not_a_number"}"#).is_err()
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = base_config();
        let rendered = format!("{:?}", config.argocd.instances[0]);
        assert!(rendered.contains("prod"));
        assert!(!rendered.contains("static-token"));
    }
}

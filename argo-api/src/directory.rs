//! Registry of the ArgoCD instances the gateway can reach.
//!
//! Built once at startup from configuration and read-only afterwards, so it
//! is shared between requests behind an `Arc` without any locking.

use crate::config::{InstanceConfig, ValidationError};
use crate::errors::GatewayError;
use indexmap::IndexMap;
use std::fmt;
use url::Url;

/// Connection details for one ArgoCD deployment.
#[derive(Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub base_url: Url,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Instance {
    /// The instance's own login, only when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl From<InstanceConfig> for Instance {
    fn from(config: InstanceConfig) -> Self {
        Instance {
            name: config.name,
            base_url: config.url,
            token: config.token,
            username: config.username,
            password: config.password,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.is_some())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Instances keyed by name, in configuration order.
#[derive(Debug, Default)]
pub struct InstanceDirectory {
    instances: IndexMap<String, Instance>,
}

impl InstanceDirectory {
    pub fn from_config(configs: Vec<InstanceConfig>) -> Result<Self, ValidationError> {
        let mut instances = IndexMap::with_capacity(configs.len());

        for config in configs {
            if config.name.is_empty() {
                return Err(ValidationError::EmptyInstanceName);
            }
            if instances.contains_key(&config.name) {
                return Err(ValidationError::DuplicateInstance(config.name));
            }
            instances.insert(config.name.clone(), Instance::from(config));
        }

        Ok(InstanceDirectory { instances })
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Result<&Instance, GatewayError> {
        self.instances
            .get(name)
            .ok_or_else(|| GatewayError::InstanceNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

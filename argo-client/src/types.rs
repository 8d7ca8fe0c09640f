use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifies zero or more applications within one instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplicationRef {
    Name(String),
    Selector(String),
}

impl ApplicationRef {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationRef::Name(name) => name,
            ApplicationRef::Selector(selector) => selector,
        }
    }
}

/// Raw JSON document returned by ArgoCD for an application query.
///
/// Name lookups yield an Application, or ArgoCD's error document once the
/// application is gone. Selector lookups yield an ApplicationList.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppData(pub Value);

impl AppData {
    /// An application record is present only while it carries `metadata`.
    pub fn has_metadata(&self) -> bool {
        self.0.get("metadata").is_some_and(|m| !m.is_null())
    }

    /// Names of the applications in an ApplicationList.
    pub fn item_names(&self) -> Vec<String> {
        self.0
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.pointer("/metadata/name").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the document describes at least one existing application.
    pub fn matches_any(&self) -> bool {
        if self.0.get("items").is_some() {
            !self.item_names().is_empty()
        } else {
            self.has_metadata()
        }
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub server: String,
    pub namespace: String,
}

/// AppProject payload for `POST /api/v1/projects`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub metadata: ObjectMeta,
    pub spec: ProjectSpecBody,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpecBody {
    pub description: String,
    pub source_repos: Vec<String>,
    pub destinations: Vec<Destination>,
}

impl ProjectSpec {
    pub fn new(name: &str, source_repo: &str, destination: Destination) -> Self {
        ProjectSpec {
            metadata: ObjectMeta {
                name: name.to_string(),
                labels: BTreeMap::new(),
            },
            spec: ProjectSpecBody {
                description: format!("Project {name}"),
                source_repos: vec![source_repo.to_string()],
                destinations: vec![destination],
            },
        }
    }
}

/// Application payload for `POST /api/v1/applications`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub metadata: ObjectMeta,
    pub spec: ApplicationSpecBody,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpecBody {
    pub project: String,
    pub source: Source,
    pub destination: Destination,
    pub sync_policy: SyncPolicy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub path: String,
    pub target_revision: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    pub automated: AutomatedSync,
    pub sync_options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSync {
    pub prune: bool,
    pub self_heal: bool,
}

impl ApplicationSpec {
    pub fn new(
        name: &str,
        project: &str,
        label: (&str, &str),
        source_repo: &str,
        source_path: &str,
        destination: Destination,
    ) -> Self {
        ApplicationSpec {
            metadata: ObjectMeta {
                name: name.to_string(),
                labels: BTreeMap::from([(label.0.to_string(), label.1.to_string())]),
            },
            spec: ApplicationSpecBody {
                project: project.to_string(),
                source: Source {
                    repo_url: source_repo.to_string(),
                    path: source_path.to_string(),
                    target_revision: "HEAD".to_string(),
                },
                destination,
                sync_policy: SyncPolicy {
                    automated: AutomatedSync {
                        prune: true,
                        self_heal: true,
                    },
                    sync_options: vec!["CreateNamespace=true".to_string()],
                },
            },
        }
    }
}

use crate::config::{ArgoConfig, InstanceConfig};
use crate::state::GatewayState;
use argo_client::{AppData, ApplicationRef, ApplicationSpec, ArgoClient, ArgoError, ProjectSpec};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

/// One recorded call against the mock, tagged with the instance host.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Login { host: String, username: String },
    GetApp { host: String, token: String, app: ApplicationRef },
    CreateProject { host: String, token: String, name: String },
    CreateApplication { host: String, token: String, name: String, project: String },
    DeleteApp { host: String, token: String, name: String },
    DeleteProject { host: String, token: String, name: String },
    SyncApp { host: String, token: String, name: String },
}

/// Scripted in-memory [`ArgoClient`].
///
/// `get_app` answers come from `get_app_by_host` first, then the front of
/// the `get_app` queue, then `get_app_default`.
pub struct MockArgoClient {
    pub login: Result<String, ArgoError>,
    pub get_app: Mutex<VecDeque<Result<AppData, ArgoError>>>,
    pub get_app_default: Result<AppData, ArgoError>,
    pub get_app_by_host: HashMap<String, Result<AppData, ArgoError>>,
    pub create_project: Result<AppData, ArgoError>,
    pub create_application: Result<AppData, ArgoError>,
    pub delete_app: Result<bool, ArgoError>,
    pub delete_project: Result<(), ArgoError>,
    pub sync_failures: HashMap<String, ArgoError>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl Default for MockArgoClient {
    fn default() -> Self {
        MockArgoClient {
            login: Ok("tok1".into()),
            get_app: Mutex::new(VecDeque::new()),
            get_app_default: Ok(app_gone()),
            get_app_by_host: HashMap::new(),
            create_project: Ok(AppData(json!({"metadata": {"name": "project"}}))),
            create_application: Ok(AppData(json!({"metadata": {"name": "application"}}))),
            delete_app: Ok(true),
            delete_project: Ok(()),
            sync_failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockArgoClient {
    pub fn with_get_app_sequence(self, responses: Vec<Result<AppData, ArgoError>>) -> Self {
        *self.get_app.lock().unwrap() = responses.into();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn logins(&self) -> usize {
        self.count(|call| matches!(call, Call::Login { .. }))
    }

    pub fn get_app_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::GetApp { .. }))
    }

    pub fn delete_app_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::DeleteApp { .. }))
    }

    pub fn delete_project_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::DeleteProject { .. }))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn host(base_url: &Url) -> String {
    base_url.host_str().unwrap_or_default().to_string()
}

#[async_trait]
impl ArgoClient for MockArgoClient {
    async fn login(
        &self,
        base_url: &Url,
        username: &str,
        _password: &str,
    ) -> Result<String, ArgoError> {
        self.record(Call::Login {
            host: host(base_url),
            username: username.into(),
        });
        self.login.clone()
    }

    async fn get_app(
        &self,
        base_url: &Url,
        token: &str,
        app: &ApplicationRef,
    ) -> Result<AppData, ArgoError> {
        let host = host(base_url);
        self.record(Call::GetApp {
            host: host.clone(),
            token: token.into(),
            app: app.clone(),
        });

        if let Some(response) = self.get_app_by_host.get(&host) {
            return response.clone();
        }
        let queued = self.get_app.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.get_app_default.clone())
    }

    async fn create_project(
        &self,
        base_url: &Url,
        token: &str,
        project: &ProjectSpec,
    ) -> Result<AppData, ArgoError> {
        self.record(Call::CreateProject {
            host: host(base_url),
            token: token.into(),
            name: project.metadata.name.clone(),
        });
        self.create_project.clone()
    }

    async fn create_application(
        &self,
        base_url: &Url,
        token: &str,
        application: &ApplicationSpec,
    ) -> Result<AppData, ArgoError> {
        self.record(Call::CreateApplication {
            host: host(base_url),
            token: token.into(),
            name: application.metadata.name.clone(),
            project: application.spec.project.clone(),
        });
        self.create_application.clone()
    }

    async fn delete_app(&self, base_url: &Url, token: &str, name: &str) -> Result<bool, ArgoError> {
        self.record(Call::DeleteApp {
            host: host(base_url),
            token: token.into(),
            name: name.into(),
        });
        self.delete_app.clone()
    }

    async fn delete_project(&self, base_url: &Url, token: &str, name: &str) -> Result<(), ArgoError> {
        self.record(Call::DeleteProject {
            host: host(base_url),
            token: token.into(),
            name: name.into(),
        });
        self.delete_project.clone()
    }

    async fn sync_app(&self, base_url: &Url, token: &str, name: &str) -> Result<AppData, ArgoError> {
        let host = host(base_url);
        self.record(Call::SyncApp {
            host: host.clone(),
            token: token.into(),
            name: name.into(),
        });
        match self.sync_failures.get(&host) {
            Some(err) => Err(err.clone()),
            None => Ok(AppData(json!({"metadata": {"name": name}}))),
        }
    }
}

pub fn app_present(name: &str) -> AppData {
    AppData(json!({"metadata": {"name": name}, "status": {"health": {"status": "Healthy"}}}))
}

/// ArgoCD's answer for an application that no longer exists.
pub fn app_gone() -> AppData {
    AppData(json!({"error": "not found", "code": 5, "message": "application not found"}))
}

pub fn app_list(names: &[&str]) -> AppData {
    let items: Vec<_> = names
        .iter()
        .map(|name| json!({"metadata": {"name": name}}))
        .collect();
    AppData(json!({"metadata": {}, "items": items}))
}

/// Instance reachable at `https://<name>.argocd.test`.
pub fn instance(name: &str, token: Option<&str>) -> InstanceConfig {
    InstanceConfig {
        name: name.into(),
        url: Url::parse(&format!("https://{name}.argocd.test")).unwrap(),
        token: token.map(String::from),
        username: None,
        password: None,
    }
}

pub fn argo_config(instances: Vec<InstanceConfig>) -> ArgoConfig {
    ArgoConfig {
        username: Some("admin".into()),
        password: Some("secret".into()),
        wait_cycles: 5,
        poll_delay_secs: 0,
        request_timeout_secs: 30,
        insecure_skip_tls_verify: false,
        destination_server: "https://kubernetes.default.svc".into(),
        label_key: "app".into(),
        instances,
    }
}

pub fn test_state(instances: Vec<InstanceConfig>, client: Arc<MockArgoClient>) -> GatewayState {
    GatewayState::new(&argo_config(instances), client).unwrap()
}

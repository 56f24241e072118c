use super::{ClientError, RegistryClient};
use crate::error::StagehandError;
use crate::types::{ModelVersion, Stage};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const API_PREFIX: &str = "api/2.0/mlflow";
const ALREADY_EXISTS: &str = "RESOURCE_ALREADY_EXISTS";

pub const TOKEN_ENV: &str = "MLFLOW_TRACKING_TOKEN";
pub const USERNAME_ENV: &str = "MLFLOW_TRACKING_USERNAME";
pub const PASSWORD_ENV: &str = "MLFLOW_TRACKING_PASSWORD";

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Credentials forwarded to the tracking server as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Auth {
    #[default]
    None,
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer(String),
}

impl Auth {
    /// Read the standard MLflow credential variables. A token wins over a
    /// username/password pair.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        )
    }

    pub fn from_vars(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        match (non_empty(token), non_empty(username)) {
            (Some(token), _) => Auth::Bearer(token),
            (None, Some(username)) => Auth::Basic {
                username,
                password: non_empty(password),
            },
            (None, None) => Auth::None,
        }
    }

    fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::None => req,
            Auth::Basic { username, password } => req.basic_auth(username, password.as_ref()),
            Auth::Bearer(token) => req.bearer_auth(token),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListArtifactsResponse {
    #[serde(default)]
    files: Vec<FileInfo>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ModelVersionResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// MlflowClient
// ---------------------------------------------------------------------------

/// [`RegistryClient`] over the MLflow REST API (`/api/2.0/mlflow/...`).
pub struct MlflowClient {
    tracking_uri: String,
    http: Client,
    auth: Auth,
}

impl MlflowClient {
    /// Fails with `InvalidConfig` when `request_timeout` is zero.
    pub fn new(tracking_uri: &str, auth: Auth, request_timeout: Duration) -> crate::Result<Self> {
        if request_timeout.is_zero() {
            return Err(StagehandError::InvalidConfig(
                "registry request timeout must be greater than 0".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StagehandError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            tracking_uri: tracking_uri.trim_end_matches('/').to_string(),
            http,
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{API_PREFIX}/{path}", self.tracking_uri)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ClientError> {
        let req = self.http.get(self.url(path)).query(query);
        self.send(req)
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ClientError> {
        let req = self.http.post(self.url(path)).json(body);
        self.send(req)
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self
            .auth
            .apply(req)
            .send()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn create_registered_model(&self, name: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "name": name });
        match self.post::<serde_json::Value>("registered-models/create", &body) {
            Ok(_) => {
                tracing::info!(name, "created registered model");
                Ok(())
            }
            Err(e) if e.code() == Some(ALREADY_EXISTS) => {
                tracing::debug!(name, "registered model already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn error_from_response(status: u16, body: &str) -> ClientError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(e) => (e.error_code, e.message),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {status}")
        } else {
            trimmed.chars().take(200).collect()
        }
    });

    match status {
        401 | 403 => ClientError::Auth { status, message },
        _ => ClientError::Api {
            status,
            code,
            message,
        },
    }
}

impl RegistryClient for MlflowClient {
    fn endpoint(&self) -> &str {
        &self.tracking_uri
    }

    fn list_artifacts(&self, run_id: &str) -> Result<Vec<String>, ClientError> {
        let resp: ListArtifactsResponse = self.get("artifacts/list", &[("run_id", run_id)])?;
        Ok(resp.files.into_iter().map(|f| f.path).collect())
    }

    fn register_model(
        &self,
        source: &str,
        name: &str,
        run_id: &str,
    ) -> Result<ModelVersion, ClientError> {
        self.create_registered_model(name)?;
        let body = serde_json::json!({
            "name": name,
            "source": source,
            "run_id": run_id,
        });
        let resp: ModelVersionResponse = self.post("model-versions/create", &body)?;
        Ok(resp.model_version)
    }

    fn get_model_version(&self, name: &str, version: &str) -> Result<ModelVersion, ClientError> {
        let resp: ModelVersionResponse =
            self.get("model-versions/get", &[("name", name), ("version", version)])?;
        Ok(resp.model_version)
    }

    fn transition_stage(
        &self,
        name: &str,
        version: &str,
        stage: Stage,
        archive_existing_versions: bool,
    ) -> Result<ModelVersion, ClientError> {
        let body = serde_json::json!({
            "name": name,
            "version": version,
            "stage": stage.as_str(),
            "archive_existing_versions": archive_existing_versions,
        });
        let resp: ModelVersionResponse = self.post("model-versions/transition-stage", &body)?;
        Ok(resp.model_version)
    }

    fn latest_versions(
        &self,
        name: &str,
        stages: &[Stage],
    ) -> Result<Vec<ModelVersion>, ClientError> {
        let stages: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
        let body = serde_json::json!({ "name": name, "stages": stages });
        let resp: LatestVersionsResponse =
            self.post("registered-models/get-latest-versions", &body)?;
        Ok(resp.model_versions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

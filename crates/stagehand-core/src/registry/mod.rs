//! Remote model registry seam.
//!
//! [`RegistryClient`] is the surface the promotion workflow and the status
//! check talk to. [`MlflowClient`] binds it to the MLflow REST API; tests
//! substitute in-memory fakes.

pub mod mlflow;

pub use mlflow::{Auth, MlflowClient};

use crate::types::{ModelVersion, Stage};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error(
        "registry rejected request (HTTP {status}, {}): {message}",
        .code.as_deref().unwrap_or("no error code")
    )]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("unexpected registry response: {0}")]
    Decode(String),
}

impl ClientError {
    /// True when the request never reached a point where the registry could
    /// judge it: network failures and rejected credentials.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Auth { .. })
    }

    /// The registry's machine-readable error code, if it sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryClient
// ---------------------------------------------------------------------------

pub trait RegistryClient {
    /// Tracking endpoint this client talks to, for log context.
    fn endpoint(&self) -> &str;

    /// Top-level artifact paths stored for `run_id`, in registry order.
    fn list_artifacts(&self, run_id: &str) -> Result<Vec<String>, ClientError>;

    /// Register `source` as a new version of the model `name`, creating the
    /// registered model first if needed.
    fn register_model(
        &self,
        source: &str,
        name: &str,
        run_id: &str,
    ) -> Result<ModelVersion, ClientError>;

    fn get_model_version(&self, name: &str, version: &str) -> Result<ModelVersion, ClientError>;

    fn transition_stage(
        &self,
        name: &str,
        version: &str,
        stage: Stage,
        archive_existing_versions: bool,
    ) -> Result<ModelVersion, ClientError>;

    /// Latest version of `name` in each of `stages`.
    fn latest_versions(
        &self,
        name: &str,
        stages: &[Stage],
    ) -> Result<Vec<ModelVersion>, ClientError>;
}

// ---------------------------------------------------------------------------
// RegistryContext
// ---------------------------------------------------------------------------

/// Everything a workflow needs to talk to the registry: the client and the
/// span its log lines are recorded under. Built once by the caller and
/// passed explicitly.
pub struct RegistryContext<C> {
    client: C,
    span: tracing::Span,
}

impl<C: RegistryClient> RegistryContext<C> {
    pub fn new(client: C) -> Self {
        let span = tracing::info_span!("registry", endpoint = %client.endpoint());
        Self { client, span }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

use crate::registry::ClientError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagehandError {
    #[error("run descriptor not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid run descriptor {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(#[source] ClientError),

    #[error(
        "model artifact '{requested}' not found in run {run_id}; found artifacts: {artifacts:?}"
    )]
    ArtifactNotFound {
        requested: String,
        run_id: String,
        artifacts: Vec<String>,
    },

    #[error("failed to register model '{name}' from {uri}: {reason}")]
    Registration {
        name: String,
        uri: String,
        reason: String,
    },

    #[error("failed to move model '{name}' version {version} to {stage}: {source}")]
    Transition {
        name: String,
        version: String,
        stage: String,
        #[source]
        source: ClientError,
    },

    #[error("{}", timed_out_message(.url, .attempts, .last_error))]
    TimedOut {
        url: String,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid stage '{0}': expected one of None, Staging, Production, Archived")]
    InvalidStage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn timed_out_message(url: &str, attempts: &u32, last_error: &Option<String>) -> String {
    match last_error {
        Some(reason) => {
            format!("{url} did not respond within {attempts} attempts (last error: {reason})")
        }
        None => format!("{url} did not respond within {attempts} attempts"),
    }
}

impl StagehandError {
    /// Map a registry failure observed while registering a model version.
    /// Transport and auth problems stay `RegistryUnavailable`; everything the
    /// server rejected becomes `Registration`.
    pub(crate) fn registration(name: &str, uri: &str, err: ClientError) -> Self {
        if err.is_unavailable() {
            return StagehandError::RegistryUnavailable(err);
        }
        StagehandError::Registration {
            name: name.to_string(),
            uri: uri.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn transition(name: &str, version: &str, stage: &str, err: ClientError) -> Self {
        if err.is_unavailable() {
            return StagehandError::RegistryUnavailable(err);
        }
        StagehandError::Transition {
            name: name.to_string(),
            version: version.to_string(),
            stage: stage.to_string(),
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, StagehandError>;

pub mod config;
pub mod promote;
pub mod status;
pub mod wait;

use anyhow::Context;
use stagehand_core::config::Config;
use stagehand_core::registry::{Auth, MlflowClient, RegistryContext};
use std::time::Duration;

/// Build the registry context from the `--tracking-uri` override or the
/// config file, with credentials from the MLflow environment variables.
pub fn registry_context(
    config: &Config,
    tracking_uri: Option<&str>,
) -> anyhow::Result<RegistryContext<MlflowClient>> {
    let uri = tracking_uri
        .map(str::to_string)
        .or_else(|| config.tracking.uri.clone())
        .filter(|u| !u.trim().is_empty())
        .context(
            "no tracking URI: set tracking.uri in stagehand.yaml, pass --tracking-uri, \
             or export MLFLOW_TRACKING_URI",
        )?;
    let client = MlflowClient::new(
        &uri,
        Auth::from_env(),
        Duration::from_secs(config.tracking.request_timeout_secs),
    )
    .context("failed to build registry client")?;
    Ok(RegistryContext::new(client))
}

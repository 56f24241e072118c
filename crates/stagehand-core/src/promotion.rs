use crate::descriptor::RunDescriptor;
use crate::error::{Result, StagehandError};
use crate::registry::{RegistryClient, RegistryContext};
use crate::types::{ModelVersion, Stage, VersionStatus};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Artifact name tried when the descriptor's `model_name` is not in the run.
pub const FALLBACK_MODEL_NAME: &str = "model";

/// Every promotion lands here. Existing versions in the stage are never
/// archived, so promotions are additive.
pub const PROMOTION_STAGE: Stage = Stage::Staging;

// ---------------------------------------------------------------------------
// PromotionPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionPolicy {
    pub fallback_name: String,
    /// Upper bound on waiting for a pending version to become READY.
    /// Zero skips the wait.
    pub registration_wait: Duration,
    pub registration_poll: Duration,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            fallback_name: FALLBACK_MODEL_NAME.to_string(),
            registration_wait: Duration::from_secs(300),
            registration_poll: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// What a successful promotion did, for printing and for downstream steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub run_id: String,
    pub requested_name: String,
    pub model_name: String,
    pub used_fallback: bool,
    pub model_uri: String,
    pub version: String,
    pub stage: Stage,
}

/// Reference to an artifact inside a run, in the registry's `runs:/` scheme.
pub fn model_uri(run_id: &str, artifact: &str) -> String {
    format!("runs:/{run_id}/{artifact}")
}

/// Pick the artifact to register: the requested name if the run has it,
/// otherwise the fallback name if the run has that.
///
/// Returns the effective name and whether the fallback was used.
pub fn resolve_model_name(
    requested: &str,
    fallback: &str,
    run_id: &str,
    artifacts: &[String],
) -> Result<(String, bool)> {
    if artifacts.iter().any(|a| a == requested) {
        return Ok((requested.to_string(), false));
    }
    if !fallback.is_empty() && artifacts.iter().any(|a| a == fallback) {
        return Ok((fallback.to_string(), true));
    }
    Err(StagehandError::ArtifactNotFound {
        requested: requested.to_string(),
        run_id: run_id.to_string(),
        artifacts: artifacts.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// promote
// ---------------------------------------------------------------------------

/// Load the run descriptor at `descriptor_path` and promote its model.
pub fn promote<C: RegistryClient>(
    ctx: &RegistryContext<C>,
    descriptor_path: &Path,
    policy: &PromotionPolicy,
) -> Result<Promotion> {
    let descriptor = RunDescriptor::load(descriptor_path)?;
    promote_run(ctx, &descriptor, policy)
}

/// Register the descriptor's artifact as a new model version and move it to
/// [`PROMOTION_STAGE`]. Fails fast: the first error aborts the run and
/// nothing is retried.
pub fn promote_run<C: RegistryClient>(
    ctx: &RegistryContext<C>,
    descriptor: &RunDescriptor,
    policy: &PromotionPolicy,
) -> Result<Promotion> {
    let _guard = ctx.span().enter();
    let client = ctx.client();
    let run_id = descriptor.run_id.as_str();

    tracing::info!(run_id, model_name = %descriptor.model_name, "using run descriptor");
    tracing::info!(run_id, "checking for artifacts");

    let artifacts = client
        .list_artifacts(run_id)
        .map_err(StagehandError::RegistryUnavailable)?;
    tracing::info!(?artifacts, "found artifacts");

    let (model_name, used_fallback) = resolve_model_name(
        &descriptor.model_name,
        &policy.fallback_name,
        run_id,
        &artifacts,
    )?;
    if used_fallback {
        tracing::warn!(
            requested = %descriptor.model_name,
            fallback = %model_name,
            "requested artifact not found in run, using fallback artifact"
        );
    }

    let uri = model_uri(run_id, &model_name);
    tracing::info!(%uri, "registering model");
    let registered = client
        .register_model(&uri, &model_name, run_id)
        .map_err(|e| StagehandError::registration(&model_name, &uri, e))?;
    tracing::info!(name = %registered.name, version = %registered.version, "model registered");

    let registered = await_ready(client, registered, &uri, policy, &mut std::thread::sleep)?;

    let stage = PROMOTION_STAGE;
    client
        .transition_stage(&registered.name, &registered.version, stage, false)
        .map_err(|e| {
            StagehandError::transition(&registered.name, &registered.version, stage.as_str(), e)
        })?;
    tracing::info!(name = %registered.name, version = %registered.version, %stage, "model promoted");

    Ok(Promotion {
        run_id: run_id.to_string(),
        requested_name: descriptor.model_name.clone(),
        model_name,
        used_fallback,
        model_uri: uri,
        version: registered.version,
        stage,
    })
}

/// Poll a freshly created version until the registry reports it READY.
fn await_ready<C: RegistryClient>(
    client: &C,
    mut version: ModelVersion,
    uri: &str,
    policy: &PromotionPolicy,
    sleep: &mut dyn FnMut(Duration),
) -> Result<ModelVersion> {
    let fail = |version: &ModelVersion, reason: String| StagehandError::Registration {
        name: version.name.clone(),
        uri: uri.to_string(),
        reason,
    };

    if policy.registration_wait.is_zero() {
        return Ok(version);
    }

    let poll_ms = policy.registration_poll.as_millis().max(1);
    let max_checks = (policy.registration_wait.as_millis() / poll_ms).max(1);
    let mut checks = 0u128;

    loop {
        match version.status {
            VersionStatus::Ready => return Ok(version),
            VersionStatus::FailedRegistration => {
                let reason = version
                    .status_message
                    .clone()
                    .unwrap_or_else(|| "registry reported FAILED_REGISTRATION".to_string());
                return Err(fail(&version, reason));
            }
            VersionStatus::PendingRegistration => {}
        }

        if checks >= max_checks {
            return Err(fail(
                &version,
                format!(
                    "version {} still pending after {}s",
                    version.version,
                    policy.registration_wait.as_secs()
                ),
            ));
        }
        checks += 1;
        tracing::debug!(version = %version.version, "waiting for registration to finish");
        sleep(policy.registration_poll);
        version = client
            .get_model_version(&version.name, &version.version)
            .map_err(|e| StagehandError::registration(&version.name, uri, e))?;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

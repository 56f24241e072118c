use crate::error::{Result, StagehandError};
use crate::registry::{RegistryClient, RegistryContext};
use crate::types::{ModelVersion, Stage};

pub fn default_stages() -> Vec<Stage> {
    vec![Stage::Staging, Stage::Production]
}

/// Latest version of `name` in each of `stages`. Any registry failure is
/// reported as `RegistryUnavailable`; the caller decides whether it is fatal.
pub fn latest_versions<C: RegistryClient>(
    ctx: &RegistryContext<C>,
    name: &str,
    stages: &[Stage],
) -> Result<Vec<ModelVersion>> {
    let _guard = ctx.span().enter();
    tracing::info!(name, ?stages, "querying latest versions");
    ctx.client()
        .latest_versions(name, stages)
        .map_err(StagehandError::RegistryUnavailable)
}

pub fn describe(version: &ModelVersion) -> String {
    format!(
        "Name: {}, Version: {}, Stage: {}",
        version.name, version.version, version.current_stage
    )
}

use crate::cmd::registry_context;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use stagehand_core::config::Config;
use stagehand_core::{io, paths, promotion};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args)]
pub struct PromoteArgs {
    /// Run descriptor JSON written by training (default: promotion.run_info)
    #[arg(long, value_name = "PATH")]
    run_info: Option<PathBuf>,

    /// Artifact to use when the descriptor's model_name is not in the run
    #[arg(long)]
    fallback_name: Option<String>,

    /// Write the promotion record as JSON to this path
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Seconds to wait for a pending registration to become READY (0 = don't wait)
    #[arg(long, value_name = "SECS")]
    registration_wait: Option<u64>,
}

pub fn run(
    root: &Path,
    args: PromoteArgs,
    tracking_uri: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let ctx = registry_context(&config, tracking_uri)?;

    let run_info = args
        .run_info
        .unwrap_or_else(|| config.promotion.run_info.clone());
    let run_info = paths::resolve(root, &run_info);

    let mut policy = config.promotion.policy();
    if let Some(name) = args.fallback_name {
        policy.fallback_name = name;
    }
    if let Some(secs) = args.registration_wait {
        policy.registration_wait = Duration::from_secs(secs);
    }

    let promoted = promotion::promote(&ctx, &run_info, &policy).context("promotion failed")?;

    if let Some(record) = args.record.or_else(|| config.promotion.record.clone()) {
        let record = paths::resolve(root, &record);
        io::write_json(&record, &promoted)
            .with_context(|| format!("failed to write promotion record {}", record.display()))?;
    }

    if json {
        print_json(&promoted)?;
        return Ok(());
    }

    if promoted.used_fallback {
        println!(
            "Artifact '{}' not found in run {}; used '{}' instead.",
            promoted.requested_name, promoted.run_id, promoted.model_name
        );
    }
    println!(
        "Model registered: name={}, version={} ({})",
        promoted.model_name, promoted.version, promoted.model_uri
    );
    println!(
        "Model successfully promoted to {}",
        promoted.stage.as_str().to_uppercase()
    );
    Ok(())
}

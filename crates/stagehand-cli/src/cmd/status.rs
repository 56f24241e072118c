use crate::cmd::registry_context;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use stagehand_core::config::Config;
use stagehand_core::status;
use stagehand_core::types::{ModelVersion, Stage};
use std::path::Path;

#[derive(Args)]
pub struct StatusArgs {
    /// Registered model name (default: status.model_name, "model")
    #[arg(long)]
    name: Option<String>,

    /// Stage to report; repeat for several (default: Staging and Production)
    #[arg(long = "stage", value_name = "STAGE")]
    stages: Vec<Stage>,
}

/// Informational only: every failure is printed and the command still
/// succeeds.
pub fn run(
    root: &Path,
    args: StatusArgs,
    tracking_uri: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    match query(root, args, tracking_uri) {
        Ok((name, versions)) => report(&name, &versions, json),
        Err(e) => {
            if json {
                print_json(&serde_json::json!({ "error": format!("{e:#}") }))?;
            } else {
                println!("Error: {e:#}");
            }
            Ok(())
        }
    }
}

fn query(
    root: &Path,
    args: StatusArgs,
    tracking_uri: Option<&str>,
) -> anyhow::Result<(String, Vec<ModelVersion>)> {
    let config = Config::load(root).context("failed to load config")?;
    let ctx = registry_context(&config, tracking_uri)?;
    let name = args.name.unwrap_or_else(|| config.status.model_name.clone());
    let stages = if args.stages.is_empty() {
        config.status.stages.clone()
    } else {
        args.stages
    };
    let versions = status::latest_versions(&ctx, &name, &stages)?;
    Ok((name, versions))
}

fn report(name: &str, versions: &[ModelVersion], json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({
            "name": name,
            "versions": versions,
        }))?;
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions of '{name}' in the requested stages.");
        return Ok(());
    }
    for v in versions {
        match v.last_updated() {
            Some(ts) => println!("{} (updated {})", status::describe(v), ts.to_rfc3339()),
            None => println!("{}", status::describe(v)),
        }
    }
    Ok(())
}

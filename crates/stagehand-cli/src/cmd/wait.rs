use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use stagehand_core::config::Config;
use stagehand_core::readiness;
use stagehand_core::StagehandError;
use std::path::Path;
use std::time::Duration;

#[derive(Args)]
pub struct WaitArgs {
    /// URL to probe (default: readiness.url, http://127.0.0.1:8000/)
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of GET attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Seconds to sleep between failed attempts
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,
}

pub fn run(root: &Path, args: WaitArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let mut settings = config.readiness.poll_settings();
    if let Some(url) = args.url {
        settings.url = url;
    }
    if let Some(n) = args.max_attempts {
        settings.max_attempts = n;
    }
    if let Some(secs) = args.interval {
        settings.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.request_timeout {
        settings.request_timeout = Duration::from_secs(secs);
    }

    if !json {
        println!("Waiting for {} to become alive...", settings.url);
    }

    match readiness::wait_for(&settings) {
        Ok(ready) => {
            if json {
                print_json(&serde_json::json!({
                    "status": "ready",
                    "url": ready.url,
                    "attempts": ready.attempts,
                    "response": ready.body,
                }))?;
            } else {
                println!("SUCCESS: Server is live! Response: {}", ready.body);
            }
            Ok(())
        }
        Err(err) => {
            let StagehandError::TimedOut {
                url,
                attempts,
                last_error,
            } = &err
            else {
                return Err(err).context("readiness check failed");
            };
            if json {
                print_json(&serde_json::json!({
                    "status": "timed_out",
                    "url": url,
                    "attempts": attempts,
                    "last_error": last_error,
                }))?;
            } else {
                println!("TIMED OUT: {err}");
            }
            // A timeout must fail the calling pipeline step.
            Err(err.into())
        }
    }
}

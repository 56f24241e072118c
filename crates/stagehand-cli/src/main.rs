mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, promote::PromoteArgs, status::StatusArgs, wait::WaitArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stagehand",
    about = "Gate pipeline steps on service readiness and promote trained runs to staging",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from stagehand.yaml or .git/)
    #[arg(long, global = true, env = "STAGEHAND_ROOT")]
    root: Option<PathBuf>,

    /// Tracking server URI (overrides tracking.uri in stagehand.yaml)
    #[arg(long, global = true, env = "MLFLOW_TRACKING_URI")]
    tracking_uri: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll an HTTP endpoint until it answers 200 or the attempt budget runs out
    Wait(WaitArgs),

    /// Register the trained run's model and move the new version to Staging
    Promote(PromoteArgs),

    /// Show the latest model versions per stage (errors are reported, never fatal)
    Status(StatusArgs),

    /// Inspect and validate stagehand.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Promote(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let tracking_uri = cli.tracking_uri.as_deref();

    let result = match cli.command {
        Commands::Wait(args) => cmd::wait::run(&root, args, cli.json),
        Commands::Promote(args) => cmd::promote::run(&root, args, tracking_uri, cli.json),
        Commands::Status(args) => cmd::status::run(&root, args, tracking_uri, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

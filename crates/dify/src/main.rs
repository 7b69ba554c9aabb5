//! dify - command-line client for Dify workflow applications.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;

use commands::{detail, logs, run, stop};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// dify - run and inspect Dify workflows
#[derive(Parser)]
#[command(name = "dify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL, e.g. https://api.dify.ai/v1
    #[arg(long, global = true, env = "DIFY_BASE_URL")]
    pub base_url: Option<String>,

    /// Application API key
    #[arg(long, global = true, env = "DIFY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file to use instead of discovery
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a published workflow
    Run(run::RunArgs),

    /// Show the state of a workflow execution
    Detail(detail::DetailArgs),

    /// Stop a streaming workflow task
    Stop(stop::StopArgs),

    /// List workflow logs, newest first
    Logs(logs::LogsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "dify=debug,dify_client=debug,dify_sse=debug,dify_config=debug,info"
    } else {
        "dify=info,dify_client=info,dify_sse=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = dify_config::load_config_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.apply_env(|name| std::env::var(name).ok());
            config
        }
        None => {
            let loaded = dify_config::load_config(None)?;
            for warning in &loaded.warnings {
                warn!("{}", warning);
            }
            loaded.config
        }
    };

    // Flags win over files and environment
    if cli.base_url.is_some() {
        config.base_url = cli.base_url;
    }
    if cli.api_key.is_some() {
        config.api_key = cli.api_key;
    }

    let ctx = commands::Context {
        config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Detail(args) => detail::run(args, &ctx).await,
        Commands::Stop(args) => stop::run(args, &ctx).await,
        Commands::Logs(args) => logs::run(args, &ctx).await,
    }
}

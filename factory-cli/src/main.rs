//! Factory — pipeline-definition to CI-workflow sync CLI.
//!
//! # Usage
//!
//! ```text
//! factory sync --repository <owner/repo> [--ref <branch>] [--apps-root apps] [--dry-run]
//! ```
//!
//! `--repository`, `--ref`, and `--token` fall back to the hosting
//! environment's `GITHUB_REPOSITORY`, `GITHUB_REF_NAME`, and `GITHUB_TOKEN`
//! variables, matching the workflow-runner contract.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::sync::SyncArgs;

#[derive(Parser, Debug)]
#[command(
    name = "factory",
    version,
    about = "Render and sync CI workflows from pipeline definition files",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the source repository and sync rendered workflow files.
    Sync(SyncArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run().await,
    }
}

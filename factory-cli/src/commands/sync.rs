//! `factory sync` — run the scan/render/sync pipeline once.

use anyhow::{bail, Context, Result};
use clap::Args;

use factory_core::{GithubClient, RepoCoordinates};
use factory_renderer::KindRegistry;
use factory_sync::pipeline::{self, ItemStatus, RunOptions, RunReport};

/// Arguments for `factory sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Source repository as "owner/repo".
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Ref or branch of the source repository to scan.
    #[arg(long = "ref", env = "GITHUB_REF_NAME", default_value = "main")]
    pub ref_name: String,

    /// API token with contents read/write access.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Root directory whose subdirectories are the applications.
    #[arg(long, default_value = "apps")]
    pub apps_root: String,

    /// Probe and render without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub async fn run(self) -> Result<()> {
        let coords = RepoCoordinates::from_slug(&self.repository, &self.ref_name)
            .with_context(|| format!("'{}' is not an owner/repo slug", self.repository))?;

        let api = GithubClient::new(&self.token).context("could not build API client")?;
        let registry = KindRegistry::with_builtins();
        let opts = RunOptions {
            apps_root: self.apps_root,
            dry_run: self.dry_run,
        };

        let report = pipeline::run(&api, &coords, &registry, &opts)
            .await
            .with_context(|| format!("sync failed for {coords}"))?;

        print_report(&report, self.dry_run);

        if report.has_failures() {
            bail!("{} definition(s) failed to sync", report.failed_count());
        }
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let elapsed = report.finished_at - report.started_at;

    for app in &report.apps {
        let failed = app
            .items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed { .. }))
            .count();
        println!(
            "{prefix}'{}' — {} definition(s), {} deploy definition(s), {} failed",
            app.app,
            app.items.len(),
            app.deploy_definitions,
            failed
        );
        for item in &app.items {
            match &item.status {
                ItemStatus::Synced { destination } => {
                    println!("  ✎  {} -> {destination}", item.path)
                }
                ItemStatus::WouldSync { destination } => {
                    println!("  ~  {} -> {destination}", item.path)
                }
                ItemStatus::Failed { reason } => println!("  ✗  {} — {reason}", item.path),
            }
        }
    }
    println!(
        "{prefix}done in {}ms ({} item(s), {} failed)",
        elapsed.num_milliseconds(),
        report.items().count(),
        report.failed_count()
    );
}

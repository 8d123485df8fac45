//! Batch pipeline — discovery, scan, parse, dispatch, render, sync.
//!
//! Control flow is a fan-out over applications and over definition files,
//! bounded by fixed internal concurrency limits. Fatal errors
//! (no apps, an application without dev definitions, unexpected scan
//! failures) abort the run; everything else is collected per item so sibling
//! items keep going.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};

use factory_core::{definition, ContentResponse, RepoApi, RepoCoordinates, SyncTarget};
use factory_renderer::{KindRegistry, Renderer};
use factory_scanner::{list_apps, scan_app};

use crate::error::SyncError;
use crate::remote::{sync_file, SyncOutcome};

/// Applications scanned concurrently.
const APP_CONCURRENCY: usize = 4;

/// Definition files processed concurrently within one application.
const DEFINITION_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// Options and report types
// ---------------------------------------------------------------------------

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root directory whose children are the application units.
    pub apps_root: String,
    /// Probe and render but perform no mutation.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            apps_root: "apps".to_owned(),
            dry_run: false,
        }
    }
}

/// Terminal state of one definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Synced { destination: String },
    WouldSync { destination: String },
    /// The item failed; siblings were unaffected.
    Failed { reason: String },
}

/// Outcome of processing one definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    /// Source path of the definition file.
    pub path: String,
    pub status: ItemStatus,
}

/// Outcome of one application's scan-and-sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReport {
    pub app: String,
    pub items: Vec<ItemReport>,
    /// Deploy-bucket size; collected for reporting, not rendered.
    pub deploy_definitions: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub apps: Vec<AppReport>,
}

impl RunReport {
    pub fn items(&self) -> impl Iterator<Item = &ItemReport> {
        self.apps.iter().flat_map(|a| a.items.iter())
    }

    pub fn failed_count(&self) -> usize {
        self.items()
            .filter(|i| matches!(i.status, ItemStatus::Failed { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run the full pipeline once.
///
/// Every run is a full re-scan and full re-render; there is no incremental
/// mode.
pub async fn run(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    registry: &KindRegistry,
    opts: &RunOptions,
) -> Result<RunReport, SyncError> {
    let started_at = Utc::now();
    let renderer = Renderer::new()?;

    let apps = list_apps(api, coords, &opts.apps_root).await?;
    tracing::info!(source = %coords, apps = apps.len(), "starting factory run");

    let reports: Vec<AppReport> = stream::iter(apps)
        .map(|app| process_app(api, coords, registry, &renderer, opts, app))
        .buffer_unordered(APP_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        apps: reports,
    })
}

async fn process_app(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    registry: &KindRegistry,
    renderer: &Renderer,
    opts: &RunOptions,
    app: String,
) -> Result<AppReport, SyncError> {
    let app_path = format!("{}/{}", opts.apps_root, app);
    // One fresh accumulator per application; scan failures are fatal.
    let scan = scan_app(api, coords, &app_path).await?;
    let deploy_definitions = scan.deploy_definitions.len();

    let items: Vec<ItemReport> = stream::iter(scan.dev_definitions)
        .map(|path| process_definition(api, coords, registry, renderer, opts.dry_run, path))
        .buffer_unordered(DEFINITION_CONCURRENCY)
        .collect()
        .await;

    Ok(AppReport {
        app,
        items,
        deploy_definitions,
    })
}

/// Process one definition file. Errors become [`ItemStatus::Failed`] so one
/// bad item never stops its siblings.
async fn process_definition(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    registry: &KindRegistry,
    renderer: &Renderer,
    dry_run: bool,
    path: String,
) -> ItemReport {
    match sync_definition(api, coords, registry, renderer, dry_run, &path).await {
        Ok(SyncOutcome::Synced { destination }) => ItemReport {
            path,
            status: ItemStatus::Synced {
                destination: destination.to_string(),
            },
        },
        Ok(SyncOutcome::WouldSync { destination }) => ItemReport {
            path,
            status: ItemStatus::WouldSync {
                destination: destination.to_string(),
            },
        },
        Err(e) => {
            tracing::warn!(definition = %path, error = %e, "definition failed; batch continues");
            ItemReport {
                path,
                status: ItemStatus::Failed {
                    reason: e.to_string(),
                },
            }
        }
    }
}

async fn sync_definition(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    registry: &KindRegistry,
    renderer: &Renderer,
    dry_run: bool,
    path: &str,
) -> Result<SyncOutcome, SyncError> {
    let response = api
        .get_content(&coords.owner, &coords.repo, path, Some(&coords.ref_name))
        .await?;
    let raw = match response {
        Some(ContentResponse::File(entry)) => entry.content,
        _ => None,
    }
    .ok_or_else(|| SyncError::MissingContent {
        path: path.to_owned(),
    })?;

    let descriptor = definition::parse(&raw, path)?;
    let plan = registry.dispatch(&descriptor)?;
    let content = renderer.render(&plan)?;

    let target = SyncTarget {
        destination: plan.destination,
        content,
    };
    sync_file(api, &target, dry_run).await
}

//! Repository-tree scanning for the factory pipeline.
//!
//! [`list_apps`] lists the immediate subdirectories of the apps root — each
//! one is an application unit. [`scan_app`] walks one application's subtree
//! depth-first and buckets definition files by filename suffix:
//!
//! | suffix                  | bucket             |
//! |-------------------------|--------------------|
//! | `factory-dev.yaml`      | dev definitions    |
//! | `factory-deploy.yaml`   | deploy definitions |
//!
//! Each top-level `scan_app` call owns a fresh accumulator; the recursion
//! threads it down by `&mut` and sibling entries are visited in API listing
//! order. An application whose full subtree holds no dev definition fails
//! its own call with [`ScanError::NoDefinitions`].

use async_recursion::async_recursion;
use thiserror::Error;

use factory_core::definition::{DEPLOY_SUFFIX, DEV_SUFFIX};
use factory_core::{ApiError, ContentResponse, EntryKind, RepoApi, RepoCoordinates, ScanResult};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from app discovery and tree scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The apps root held no directories (or nothing at all).
    #[error("no application directories found under '{root}'")]
    NoApps { root: String },

    /// One application's full subtree held no dev definition file.
    #[error("no 'factory-dev.yaml' definition found under '{app}'")]
    NoDefinitions { app: String },

    /// The API returned a single file where a directory listing was expected.
    #[error("expected a directory listing at '{path}'")]
    UnexpectedListing { path: String },

    /// Transport or protocol failure from the remote API.
    #[error("scan API error: {0}")]
    Api(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// App discovery
// ---------------------------------------------------------------------------

/// List the immediate child directories of `root`. Files at that level are
/// ignored; an empty result is [`ScanError::NoApps`].
pub async fn list_apps(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    root: &str,
) -> Result<Vec<String>, ScanError> {
    let response = api
        .get_content(&coords.owner, &coords.repo, root, Some(&coords.ref_name))
        .await?;

    let entries = match response {
        Some(ContentResponse::Listing(entries)) => entries,
        // A missing root and a root that resolves to a file both mean the
        // run has no applications to process.
        Some(ContentResponse::File(_)) | None => Vec::new(),
    };

    let apps: Vec<String> = entries
        .into_iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .map(|e| e.name)
        .collect();

    if apps.is_empty() {
        return Err(ScanError::NoApps {
            root: root.to_owned(),
        });
    }
    tracing::debug!(root, count = apps.len(), "discovered application directories");
    Ok(apps)
}

// ---------------------------------------------------------------------------
// Tree scanner
// ---------------------------------------------------------------------------

/// Scan one application subtree rooted at `app_path`.
///
/// Returns the accumulated buckets, or [`ScanError::NoDefinitions`] when the
/// dev bucket is still empty after the full traversal.
pub async fn scan_app(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    app_path: &str,
) -> Result<ScanResult, ScanError> {
    let mut acc = ScanResult::default();
    walk(api, coords, app_path, &mut acc).await?;

    if acc.dev_definitions.is_empty() {
        return Err(ScanError::NoDefinitions {
            app: app_path.to_owned(),
        });
    }
    tracing::debug!(
        app = app_path,
        dev = acc.dev_definitions.len(),
        deploy = acc.deploy_definitions.len(),
        "application scan complete"
    );
    Ok(acc)
}

#[async_recursion]
async fn walk(
    api: &dyn RepoApi,
    coords: &RepoCoordinates,
    path: &str,
    acc: &mut ScanResult,
) -> Result<(), ScanError> {
    let response = api
        .get_content(&coords.owner, &coords.repo, path, Some(&coords.ref_name))
        .await?;

    let entries = match response {
        Some(ContentResponse::Listing(entries)) => entries,
        Some(ContentResponse::File(_)) | None => {
            return Err(ScanError::UnexpectedListing {
                path: path.to_owned(),
            });
        }
    };

    for entry in entries {
        match entry.kind {
            EntryKind::File if entry.name.ends_with(DEV_SUFFIX) => {
                acc.dev_definitions.push(entry.path);
            }
            EntryKind::File if entry.name.ends_with(DEPLOY_SUFFIX) => {
                acc.deploy_definitions.push(entry.path);
            }
            EntryKind::Dir => {
                walk(api, coords, &entry.path, acc).await?;
            }
            _ => {}
        }
    }
    Ok(())
}

//! Remote file sync — the probe → delete-if-exists → create-or-update
//! protocol.
//!
//! The protocol is strictly ordered and never short-circuits on unchanged
//! content:
//!
//! 1. Probe the destination path. A 404 and a hit are both valid results.
//! 2. If the probe resolved to a single file entry, delete it first with its
//!    sha (the API's optimistic-concurrency handle) and an empty commit
//!    message. A delete failure is logged and swallowed.
//! 3. Create-or-update the path with the transport-encoded rendered bytes.
//!
//! Re-running against an unchanged target leaves the destination file
//! byte-identical; the second run's probe observes the first run's write.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use factory_core::{ContentResponse, Destination, RepoApi, SyncTarget};

use crate::error::SyncError;

/// Commit message for every create-or-update.
pub const COMMIT_MESSAGE: &str = "add/update file from action";

/// Outcome of syncing one rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The destination now holds the rendered bytes.
    Synced { destination: Destination },
    /// Dry-run mode: the file would have been written.
    WouldSync { destination: Destination },
}

/// Ensure the target path holds exactly the rendered content.
///
/// With `dry_run` the probe still runs but no mutation is performed.
pub async fn sync_file(
    api: &dyn RepoApi,
    target: &SyncTarget,
    dry_run: bool,
) -> Result<SyncOutcome, SyncError> {
    let dest = &target.destination;

    // Step 1: probe. A transport failure here aborts the item; a 404 or a
    // directory listing simply means there is nothing to delete.
    let probe = api
        .get_content(&dest.owner, &dest.repo, &dest.path, Some(&dest.branch))
        .await?;

    if dry_run {
        tracing::info!(destination = %dest, "[dry-run] would sync");
        return Ok(SyncOutcome::WouldSync {
            destination: dest.clone(),
        });
    }

    // Step 2: delete stale content. Failure is logged and swallowed so the
    // create-or-update still runs.
    if let Some(ContentResponse::File(existing)) = probe {
        if let Err(e) = api
            .delete_file(
                &dest.owner,
                &dest.repo,
                &dest.path,
                &dest.branch,
                &existing.sha,
                "",
            )
            .await
        {
            tracing::warn!(
                destination = %dest,
                operation = "delete",
                error = %e,
                "failed to delete existing file; continuing with update"
            );
        }
    }

    // Step 3: unconditional create-or-update.
    let encoded = STANDARD.encode(target.content.as_bytes());
    api.put_file(
        &dest.owner,
        &dest.repo,
        &dest.path,
        &dest.branch,
        &encoded,
        COMMIT_MESSAGE,
    )
    .await?;

    tracing::info!(destination = %dest, bytes = target.content.len(), "synced");
    Ok(SyncOutcome::Synced {
        destination: dest.clone(),
    })
}

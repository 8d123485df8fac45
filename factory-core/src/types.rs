//! Domain types for the factory pipeline.
//!
//! Repository paths handled here are remote API paths (forward-slash
//! strings), never local filesystem paths.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed module name, derived from a dev-definition filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleName(pub String);

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Identifies the source tree being scanned. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
    /// Branch or ref name the scan reads from.
    pub ref_name: String,
}

impl RepoCoordinates {
    /// Parse a `"owner/repo"` slug (the `GITHUB_REPOSITORY` shape).
    pub fn from_slug(slug: &str, ref_name: &str) -> Option<Self> {
        let (owner, repo) = slug.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            ref_name: ref_name.to_owned(),
        })
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.ref_name)
    }
}

// ---------------------------------------------------------------------------
// Scan accumulator
// ---------------------------------------------------------------------------

/// Typed buckets accumulated by one application subtree's traversal.
///
/// One instance per top-level scan call; threaded down the recursion by
/// `&mut`, never aliased across concurrent application scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Full paths of files ending in the dev-definition suffix.
    pub dev_definitions: Vec<String>,
    /// Full paths of files ending in the deploy-definition suffix.
    pub deploy_definitions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// One parsed pipeline definition. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDescriptor {
    /// The `template.type` tag selecting a render strategy.
    pub template_kind: String,
    /// Derived from the definition filename with the dev suffix stripped.
    pub module_name: ModuleName,
    /// The `template.spec.stages` mapping, kept free-form.
    pub stages: serde_yaml::Value,
}

// ---------------------------------------------------------------------------
// Sync target
// ---------------------------------------------------------------------------

/// Where a rendered workflow file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Path inside the destination repository, e.g. `.github/workflows/x.yml`.
    pub path: String,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}:{}", self.owner, self.repo, self.branch, self.path)
    }
}

/// A fully resolved (destination, rendered content) pair, consumed exactly
/// once by the remote file sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub destination: Destination,
    /// Rendered file content, not yet transport-encoded.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

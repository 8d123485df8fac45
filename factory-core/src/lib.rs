//! Factory core library — domain types, definition parsing, remote API.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`definition`] — definition-file decoding and descriptor extraction
//! - [`api`] — the [`RepoApi`] trait and its GitHub implementation
//! - [`error`] — [`DefinitionError`] and [`ApiError`]

pub mod api;
pub mod definition;
pub mod error;
pub mod types;

pub use api::{ContentResponse, EntryKind, FileEntry, GithubClient, RepoApi};
pub use error::{ApiError, DefinitionError};
pub use types::{
    Destination, ModuleName, PipelineDescriptor, RepoCoordinates, ScanResult, SyncTarget,
};

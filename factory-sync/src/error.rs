//! Error types for factory-sync.

use thiserror::Error;

use factory_core::{ApiError, DefinitionError};
use factory_renderer::RenderError;
use factory_scanner::ScanError;

/// All errors that can arise from the sync pipeline.
///
/// Scan variants are fatal to a run; the remaining variants are collected
/// per item by the pipeline and never abort sibling items.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Discovery or tree-scan failure.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// A definition file failed to decode or parse.
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Dispatch or template rendering failure.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Remote API failure during probe or create-or-update.
    #[error("sync API error: {0}")]
    Api(#[from] ApiError),

    /// The contents API returned a definition file without its content.
    #[error("no content returned for definition '{path}'")]
    MissingContent { path: String },
}

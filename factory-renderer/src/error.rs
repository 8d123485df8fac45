//! Error types for factory-renderer.

use thiserror::Error;

/// All errors that can arise from dispatch and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (missing template, compile, render).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// The descriptor's kind tag matched no registered handler.
    #[error("no template registered for kind '{kind}'")]
    UnknownKind { kind: String },

    /// A field the matched kind requires was absent from the stage graph.
    #[error("module '{module}' is missing required stage field '{field}'")]
    MissingStageField { module: String, field: &'static str },

    /// A stage field was present but unusable (e.g. a projectId without '/').
    #[error("module '{module}' has invalid '{field}': '{value}'")]
    InvalidStageField {
        module: String,
        field: &'static str,
        value: String,
    },
}

//! Render context — the serializable variable set handed to a template.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::RenderError;

/// Variables interpolated into a workflow template.
///
/// `module_name` and `target_branch` are common to every kind; kind-specific
/// extras ride along flattened so templates address them by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    pub module_name: String,
    pub target_branch: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new(module_name: impl Into<String>, target_branch: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            target_branch: target_branch.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

//! Kind registry and tera rendering engine.
//!
//! # Built-in kinds
//!
//! | kind        | template               | destination resolution                     |
//! |-------------|------------------------|--------------------------------------------|
//! | `openshift` | `openshift.yml.tera`   | `pullCode.spec.gitlab.projectId` + branch  |
//!
//! The destination file path is always `.github/workflows/{module}.yml`.

use std::collections::HashMap;

use tera::Tera;

use factory_core::definition::lookup;
use factory_core::{Destination, PipelineDescriptor};

use crate::context::RenderContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[(
    "openshift.yml.tera",
    include_str!("templates/openshift.yml.tera"),
)];

// ---------------------------------------------------------------------------
// Render plan
// ---------------------------------------------------------------------------

/// Everything a matched kind resolved for one descriptor: which template to
/// render, with what variables, written where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub template: &'static str,
    pub context: RenderContext,
    pub destination: Destination,
}

/// A kind's plan builder.
pub type KindHandler = fn(&PipelineDescriptor) -> Result<RenderPlan, RenderError>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Open mapping from kind tag to plan builder.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    handlers: HashMap<String, KindHandler>,
}

impl KindRegistry {
    /// An empty registry with no kinds.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The registry with all built-in kinds registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("openshift", openshift_plan);
        registry
    }

    /// Register (or replace) the handler for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, handler: KindHandler) {
        self.handlers.insert(kind.into(), handler);
    }

    /// Registered kind tags, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the render plan for a descriptor's declared kind.
    ///
    /// An unmatched tag is [`RenderError::UnknownKind`] — reported per item,
    /// never fatal to the batch.
    pub fn dispatch(&self, descriptor: &PipelineDescriptor) -> Result<RenderPlan, RenderError> {
        let handler =
            self.handlers
                .get(&descriptor.template_kind)
                .ok_or_else(|| RenderError::UnknownKind {
                    kind: descriptor.template_kind.clone(),
                })?;
        handler(descriptor)
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Built-in: openshift
// ---------------------------------------------------------------------------

fn stage_str<'a>(
    descriptor: &'a PipelineDescriptor,
    module: &str,
    field: &'static str,
) -> Result<&'a str, RenderError> {
    lookup(&descriptor.stages, field)
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| RenderError::MissingStageField {
            module: module.to_owned(),
            field,
        })
}

fn openshift_plan(descriptor: &PipelineDescriptor) -> Result<RenderPlan, RenderError> {
    let module = descriptor.module_name.to_string();

    let project_id = stage_str(descriptor, &module, "pullCode.spec.gitlab.projectId")?;
    let branch = stage_str(descriptor, &module, "pullCode.spec.gitlab.branch")?;

    let (owner, repo) = project_id
        .split_once('/')
        .filter(|(o, r)| !o.is_empty() && !r.is_empty())
        .ok_or_else(|| RenderError::InvalidStageField {
            module: module.clone(),
            field: "pullCode.spec.gitlab.projectId",
            value: project_id.to_owned(),
        })?;

    Ok(RenderPlan {
        template: "openshift.yml.tera",
        context: RenderContext::new(module.as_str(), branch),
        destination: Destination {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            branch: branch.to_owned(),
            path: format!(".github/workflows/{module}.yml"),
        },
    })
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Tera renderer over the embedded templates. Create once and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TPLS.to_vec())?;
        Ok(Self { tera })
    }

    /// Render the plan's template against its context.
    ///
    /// Pure in (template content, context); no external state is consulted.
    pub fn render(&self, plan: &RenderPlan) -> Result<String, RenderError> {
        let ctx = plan.context.to_tera_context()?;
        Ok(self.tera.render(plan.template, &ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

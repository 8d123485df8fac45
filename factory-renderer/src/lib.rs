//! # factory-renderer
//!
//! Template-kind dispatch and tera-based workflow rendering.
//!
//! A [`KindRegistry`] maps a descriptor's `template.type` tag to a plan
//! builder; the builder resolves the destination repository and the
//! [`RenderContext`], and the [`Renderer`] interpolates the kind's embedded
//! template. Adding a kind is a single [`KindRegistry::register`] call.

pub mod context;
pub mod engine;
pub mod error;

pub use context::RenderContext;
pub use engine::{KindHandler, KindRegistry, RenderPlan, Renderer};
pub use error::RenderError;

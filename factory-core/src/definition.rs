//! Definition-file decoding and descriptor extraction.
//!
//! Definition files arrive base64-encoded from the contents API, possibly
//! with embedded line breaks. Decoding strips whitespace first, then parses
//! the decoded text as YAML and extracts the descriptor fields:
//!
//! - `template.type`        → [`PipelineDescriptor::template_kind`]
//! - `template.spec.stages` → [`PipelineDescriptor::stages`]
//!
//! The module name is the file's base name with the dev suffix stripped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_yaml::Value;

use crate::error::DefinitionError;
use crate::types::{ModuleName, PipelineDescriptor};

/// Filename suffix marking a dev pipeline definition.
pub const DEV_SUFFIX: &str = "factory-dev.yaml";

/// Filename suffix marking a deploy pipeline definition.
pub const DEPLOY_SUFFIX: &str = "factory-deploy.yaml";

// ---------------------------------------------------------------------------
// Lookup helper
// ---------------------------------------------------------------------------

/// Resolve a dotted key path (`"template.spec.stages"`) inside a YAML value.
///
/// Returns `None` when any segment is absent or the intermediate value is
/// not a mapping.
pub fn lookup<'a>(doc: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in dotted.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// Module name derivation
// ---------------------------------------------------------------------------

/// Derive the module name from a dev-definition path.
///
/// `apps/checkout/pipeline.factory-dev.yaml` → `pipeline`.
/// Returns `None` when the base name does not end in [`DEV_SUFFIX`].
pub fn module_name(path: &str) -> Option<ModuleName> {
    let base = path.rsplit('/').next()?;
    let stem = base.strip_suffix(DEV_SUFFIX)?;
    let stem = stem.trim_end_matches('.');
    if stem.is_empty() {
        return None;
    }
    Some(ModuleName::from(stem))
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Decode one definition file's transport-encoded content into a descriptor.
pub fn parse(raw_base64: &str, path: &str) -> Result<PipelineDescriptor, DefinitionError> {
    let module_name = module_name(path).ok_or_else(|| DefinitionError::BadFileName {
        path: path.to_owned(),
    })?;

    // The contents API wraps base64 at 60 columns; strip all whitespace
    // before decoding.
    let compact: String = raw_base64.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| DefinitionError::Base64 {
            path: path.to_owned(),
            source,
        })?;
    let text = String::from_utf8(bytes).map_err(|source| DefinitionError::Utf8 {
        path: path.to_owned(),
        source,
    })?;

    let doc: Value = serde_yaml::from_str(&text).map_err(|source| DefinitionError::Yaml {
        path: path.to_owned(),
        source,
    })?;

    let template_kind = lookup(&doc, "template.type")
        .and_then(Value::as_str)
        .ok_or(DefinitionError::MissingField {
            path: path.to_owned(),
            field: "template.type",
        })?
        .to_owned();

    let stages = lookup(&doc, "template.spec.stages")
        .filter(|v| v.is_mapping())
        .cloned()
        .ok_or(DefinitionError::MissingField {
            path: path.to_owned(),
            field: "template.spec.stages",
        })?;

    Ok(PipelineDescriptor {
        template_kind,
        module_name,
        stages,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const DOC: &str = r#"
template:
  type: openshift
  spec:
    stages:
      pullCode:
        spec:
          gitlab:
            projectId: org/checkout
            branch: main
"#;

    fn encode(text: &str) -> String {
        STANDARD.encode(text.as_bytes())
    }

    #[rstest]
    #[case("apps/checkout/pipeline.factory-dev.yaml", Some("pipeline"))]
    #[case("pipeline.factory-dev.yaml", Some("pipeline"))]
    #[case("apps/a/b/web-api.factory-dev.yaml", Some("web-api"))]
    #[case("apps/checkout/pipeline.factory-deploy.yaml", None)]
    #[case("apps/checkout/readme.md", None)]
    #[case("apps/checkout/.factory-dev.yaml", None)]
    fn module_name_derivation(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(module_name(path), expected.map(ModuleName::from));
    }

    #[test]
    fn parse_extracts_kind_module_and_stages() {
        let d = parse(&encode(DOC), "apps/checkout/pipeline.factory-dev.yaml").expect("parse");
        assert_eq!(d.template_kind, "openshift");
        assert_eq!(d.module_name, ModuleName::from("pipeline"));
        let project = lookup(&d.stages, "pullCode.spec.gitlab.projectId")
            .and_then(Value::as_str)
            .expect("projectId");
        assert_eq!(project, "org/checkout");
    }

    #[test]
    fn parse_accepts_wrapped_base64() {
        let mut wrapped = String::new();
        for chunk in encode(DOC).into_bytes().chunks(60) {
            wrapped.push_str(std::str::from_utf8(chunk).unwrap());
            wrapped.push('\n');
        }
        let d = parse(&wrapped, "apps/x/m.factory-dev.yaml").expect("parse wrapped");
        assert_eq!(d.template_kind, "openshift");
    }

    #[test]
    fn parse_rejects_bad_base64() {
        let err = parse("not//valid==base64!!", "apps/x/m.factory-dev.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Base64 { .. }), "got: {err}");
        assert!(err.to_string().contains("m.factory-dev.yaml"));
    }

    #[test]
    fn parse_rejects_malformed_yaml() {
        let err = parse(
            &encode(": : bad : yaml : [unclosed"),
            "apps/x/m.factory-dev.yaml",
        )
        .unwrap_err();
        assert!(matches!(err, DefinitionError::Yaml { .. }), "got: {err}");
    }

    #[test]
    fn parse_rejects_missing_template_type() {
        let err = parse(
            &encode("template:\n  spec:\n    stages: {}\n"),
            "apps/x/m.factory-dev.yaml",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MissingField { field: "template.type", .. }
        ));
    }

    #[test]
    fn parse_rejects_non_mapping_stages() {
        let err = parse(
            &encode("template:\n  type: openshift\n  spec:\n    stages: 42\n"),
            "apps/x/m.factory-dev.yaml",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MissingField { field: "template.spec.stages", .. }
        ));
    }

    #[test]
    fn parse_rejects_non_dev_filename() {
        let err = parse(&encode(DOC), "apps/x/m.factory-deploy.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::BadFileName { .. }));
    }

    #[test]
    fn stage_graph_roundtrips_through_yaml() {
        let d = parse(&encode(DOC), "apps/checkout/pipeline.factory-dev.yaml").expect("parse");
        let serialized = serde_yaml::to_string(&d.stages).expect("serialize stages");
        let reparsed: Value = serde_yaml::from_str(&serialized).expect("reparse stages");
        assert_eq!(reparsed, d.stages, "stage graph must round-trip field-for-field");
    }

    #[test]
    fn lookup_returns_none_on_scalar_intermediate() {
        let doc: Value = serde_yaml::from_str("a: 1").unwrap();
        assert!(lookup(&doc, "a.b").is_none());
        assert!(lookup(&doc, "missing").is_none());
    }
}

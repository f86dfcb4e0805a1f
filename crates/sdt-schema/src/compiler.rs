//! # Validator Compiler
//!
//! Turns a target schema plus the registry it lives in into a
//! [`CompiledValidator`]. Every registry schema is handed to the engine first
//! so that cross-schema `$ref`s resolve, then the target is compiled.
//!
//! Before the engine sees the target, each non-local `$ref` it contains is
//! checked against the registry. An unknown identifier, or a relative
//! reference inside a schema whose `$id` is not hierarchical (`urn:...`), is
//! reported by name as [`SchemaError::UnresolvedReference`] instead of
//! surfacing as an opaque engine error.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::{has_uri_scheme, JsonSchemaEngine, ValidationEngine};
use crate::error::SchemaError;
use crate::registry::{RegisteredSchema, SchemaRegistry};
use crate::runner::{self, ValidationOutcome};

/// Keywords whose values are data, not subschemas.
const DATA_KEYWORDS: &[&str] = &["const", "default", "enum", "examples"];

/// Keywords whose values map arbitrary names to subschemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Metaschema URIs the engine ships with.
const BUNDLED_PREFIXES: &[&str] = &["https://json-schema.org/", "http://json-schema.org/"];

/// An immutable, reusable validator for one schema.
///
/// Cloning is cheap; clones share the compiled engine state. The validator
/// is a snapshot: editing the schema files afterwards has no effect on it.
pub struct CompiledValidator<E: ValidationEngine = JsonSchemaEngine> {
    schema_key: String,
    inner: Arc<E::Compiled>,
}

impl<E: ValidationEngine> CompiledValidator<E> {
    /// Registry key of the schema this validator enforces.
    pub fn schema_key(&self) -> &str {
        &self.schema_key
    }

    pub(crate) fn inner(&self) -> &E::Compiled {
        &self.inner
    }

    /// Validate `instance`, collecting every violation.
    pub fn validate(&self, instance: &Value) -> ValidationOutcome {
        runner::run(self, instance)
    }
}

impl<E: ValidationEngine> Clone for CompiledValidator<E> {
    fn clone(&self) -> Self {
        Self {
            schema_key: self.schema_key.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: ValidationEngine> fmt::Debug for CompiledValidator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("schema_key", &self.schema_key)
            .finish_non_exhaustive()
    }
}

/// Compile `target` with the default `jsonschema` engine.
///
/// # Errors
///
/// [`SchemaError::UnresolvedReference`] for a `$ref` to an identifier absent
/// from `registry`; [`SchemaError::Compile`] if the engine rejects the schema.
pub fn compile(
    registry: &SchemaRegistry,
    target: &RegisteredSchema,
) -> Result<CompiledValidator, SchemaError> {
    compile_with(JsonSchemaEngine::default(), registry, target)
}

/// Compile `target` with a caller-supplied engine.
pub fn compile_with<E: ValidationEngine>(
    mut engine: E,
    registry: &SchemaRegistry,
    target: &RegisteredSchema,
) -> Result<CompiledValidator<E>, SchemaError> {
    for schema in registry.all() {
        engine.register_schema(&schema.key, &schema.source, &schema.document);
    }

    check_references(registry, target)?;

    let compiled = engine
        .compile(&target.document)
        .map_err(|reason| SchemaError::Compile {
            schema: target.key.clone(),
            reason,
        })?;

    tracing::debug!(
        schema = %target.key,
        source = %target.source,
        registered = registry.len(),
        "compiled schema validator"
    );

    Ok(CompiledValidator {
        schema_key: target.key.clone(),
        inner: Arc::new(compiled),
    })
}

// ---------------------------------------------------------------------------
// Reference pre-check
// ---------------------------------------------------------------------------

fn check_references(
    registry: &SchemaRegistry,
    target: &RegisteredSchema,
) -> Result<(), SchemaError> {
    let base = target.document.get("$id").and_then(Value::as_str);

    let mut refs = Vec::new();
    collect_refs(&target.document, &mut refs);

    for reference in refs {
        let resource = reference.split('#').next().unwrap_or_default();
        if resource.is_empty() || BUNDLED_PREFIXES.iter().any(|p| resource.starts_with(p)) {
            continue;
        }
        if !resolves(registry, base, resource) {
            return Err(SchemaError::UnresolvedReference {
                schema: target.key.clone(),
                reference: reference.to_string(),
            });
        }
    }
    Ok(())
}

/// Collect `$ref`s from `schema`. Names inside `properties`-like maps are
/// never treated as keywords.
fn collect_refs<'a>(schema: &'a Value, acc: &mut Vec<&'a str>) {
    match schema {
        Value::Object(map) => {
            for (key, child) in map {
                let key = key.as_str();
                if key == "$ref" {
                    if let Some(reference) = child.as_str() {
                        acc.push(reference);
                    }
                } else if SCHEMA_MAP_KEYWORDS.contains(&key) {
                    if let Some(named) = child.as_object() {
                        for subschema in named.values() {
                            collect_refs(subschema, acc);
                        }
                    }
                } else if !DATA_KEYWORDS.contains(&key) {
                    collect_refs(child, acc);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, acc);
            }
        }
        _ => {}
    }
}

fn resolves(registry: &SchemaRegistry, base: Option<&str>, resource: &str) -> bool {
    let resolved = match base {
        // A relative reference has no meaning against a `urn:`-style base.
        Some(base) if !has_uri_scheme(resource) && !is_hierarchical(base) => return false,
        Some(base) if !has_uri_scheme(resource) => join_relative(base, resource),
        _ => resource.to_string(),
    };
    if base == Some(resolved.as_str()) {
        return true;
    }

    let filename = resolved.rsplit('/').next().unwrap_or(&resolved);
    [resource, resolved.as_str(), filename]
        .iter()
        .any(|candidate| {
            registry.entry(candidate).is_some() || registry.by_source(candidate).is_some()
        })
}

/// Whether relative references can be resolved against `base`.
fn is_hierarchical(base: &str) -> bool {
    match base.split_once(':') {
        Some((_, rest)) if has_uri_scheme(base) => rest.starts_with('/'),
        _ => true,
    }
}

/// Resolve `reference` against the directory part of `base`.
fn join_relative(base: &str, reference: &str) -> String {
    let reference = reference.trim_start_matches("./");
    match base.rfind('/') {
        Some(idx) => format!("{}{reference}", &base[..=idx]),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadedSchema;
    use crate::runner::Violation;
    use serde_json::json;

    fn registry(schemas: &[(&str, Value)]) -> SchemaRegistry {
        SchemaRegistry::build(
            schemas
                .iter()
                .map(|(source, document)| LoadedSchema {
                    source: source.to_string(),
                    document: document.clone(),
                })
                .collect(),
        )
        .unwrap()
    }

    /// Records which schemas were registered before compilation.
    #[derive(Default)]
    struct RecordingEngine {
        registered: Vec<String>,
    }

    impl ValidationEngine for RecordingEngine {
        type Compiled = Vec<String>;

        fn register_schema(&mut self, key: &str, _source: &str, _schema: &Value) {
            self.registered.push(key.to_string());
        }

        fn compile(&self, _schema: &Value) -> Result<Vec<String>, String> {
            Ok(self.registered.clone())
        }

        fn run(compiled: &Vec<String>, _instance: &Value) -> Vec<Violation> {
            compiled.iter().map(|k| Violation::new(k.clone(), "")).collect()
        }
    }

    #[test]
    fn test_every_schema_registered_before_compile() {
        let reg = registry(&[
            ("a.json", json!({"$id": "urn:a"})),
            ("b.json", json!({"$id": "urn:b"})),
        ]);
        let target = reg.entry("urn:a").unwrap();
        let validator = compile_with(RecordingEngine::default(), &reg, target).unwrap();
        assert_eq!(validator.schema_key(), "urn:a");
        assert_eq!(validator.inner(), &vec!["urn:a".to_string(), "urn:b".to_string()]);
    }

    #[test]
    fn test_cross_schema_ref_by_id() {
        let reg = registry(&[
            (
                "money.json",
                json!({"$id": "urn:money", "type": "number", "minimum": 0}),
            ),
            (
                "billing.json",
                json!({"$id": "urn:billing", "properties": {"amount": {"$ref": "urn:money"}}}),
            ),
        ]);
        let validator = compile(&reg, reg.entry("urn:billing").unwrap()).unwrap();

        assert!(validator.validate(&json!({"amount": 3})).is_valid());
        let outcome = validator.validate(&json!({"amount": -3}));
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.violations()[0].instance_path, "/amount");
        assert_eq!(outcome.violations()[0].message, "must be >= 0");
    }

    #[test]
    fn test_relative_ref_against_base() {
        let reg = registry(&[
            (
                "common.schema.json",
                json!({
                    "$id": "https://sdt.example/spec/common.schema.json",
                    "$defs": {"name": {"type": "string", "minLength": 1}}
                }),
            ),
            (
                "agent.schema.json",
                json!({
                    "$id": "https://sdt.example/spec/agent.schema.json",
                    "properties": {"name": {"$ref": "common.schema.json#/$defs/name"}}
                }),
            ),
        ]);
        let target = reg.by_source("agent.schema.json").unwrap();
        let validator = compile(&reg, target).unwrap();
        assert!(validator.validate(&json!({"name": "ok"})).is_valid());
        assert!(!validator.validate(&json!({"name": ""})).is_valid());
    }

    #[test]
    fn test_unknown_reference_named() {
        let reg = registry(&[(
            "agent.json",
            json!({"$id": "urn:agent", "properties": {"t": {"$ref": "urn:template#/$defs/x"}}}),
        )]);
        let err = compile(&reg, reg.entry("urn:agent").unwrap()).unwrap_err();
        match err {
            SchemaError::UnresolvedReference { schema, reference } => {
                assert_eq!(schema, "urn:agent");
                assert_eq!(reference, "urn:template#/$defs/x");
            }
            other => panic!("expected UnresolvedReference, got: {other}"),
        }
    }

    #[test]
    fn test_relative_ref_against_urn_base_is_unresolved() {
        let reg = registry(&[
            ("money.json", json!({"title": "Money", "minimum": 0})),
            (
                "billing.json",
                json!({"$id": "urn:billing", "properties": {"amount": {"$ref": "Money"}}}),
            ),
        ]);
        let err = compile(&reg, reg.entry("urn:billing").unwrap()).unwrap_err();
        match err {
            SchemaError::UnresolvedReference { schema, reference } => {
                assert_eq!(schema, "urn:billing");
                assert_eq!(reference, "Money");
            }
            other => panic!("expected UnresolvedReference, got: {other}"),
        }
    }

    #[test]
    fn test_title_ref_from_schema_without_id() {
        let reg = registry(&[
            ("money.json", json!({"title": "Money", "minimum": 0})),
            (
                "billing.json",
                json!({"title": "Billing", "properties": {"amount": {"$ref": "Money"}}}),
            ),
        ]);
        let validator = compile(&reg, reg.entry("Billing").unwrap()).unwrap();
        assert_eq!(validator.validate(&json!({"amount": -1})).len(), 1);
    }

    #[test]
    fn test_ref_under_property_named_like_data_keyword() {
        let reg = registry(&[(
            "settings.json",
            json!({
                "$id": "urn:settings",
                "properties": {
                    "default": {"$ref": "urn:missing"},
                    "enum": {"type": "string"}
                }
            }),
        )]);
        let err = compile(&reg, reg.entry("urn:settings").unwrap()).unwrap_err();
        assert!(
            matches!(err, SchemaError::UnresolvedReference { ref reference, .. } if reference == "urn:missing"),
            "got: {err}"
        );
    }

    #[test]
    fn test_is_hierarchical() {
        assert!(is_hierarchical("https://sdt.dev/spec/a.json"));
        assert!(is_hierarchical("a.json"));
        assert!(!is_hierarchical("urn:billing"));
    }

    #[test]
    fn test_local_refs_need_no_registry() {
        let reg = registry(&[(
            "local.json",
            json!({
                "$id": "urn:local",
                "$defs": {"pos": {"minimum": 0}},
                "properties": {"n": {"$ref": "#/$defs/pos"}},
                "examples": [{"$ref": "not-a-reference"}]
            }),
        )]);
        assert!(compile(&reg, reg.entry("urn:local").unwrap()).is_ok());
    }

    #[test]
    fn test_structurally_invalid_schema() {
        let reg = registry(&[("bad.json", json!({"$id": "urn:bad", "type": 42}))]);
        let err = compile(&reg, reg.entry("urn:bad").unwrap()).unwrap_err();
        match err {
            SchemaError::Compile { schema, reason } => {
                assert_eq!(schema, "urn:bad");
                assert!(!reason.is_empty());
            }
            other => panic!("expected Compile, got: {other}"),
        }
    }

    #[test]
    fn test_validator_is_send_sync_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledValidator>();

        let reg = registry(&[(
            "n.json",
            json!({"$id": "urn:n", "type": "integer", "minimum": 0}),
        )]);
        let validator = compile(&reg, reg.entry("urn:n").unwrap()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let v = validator.clone();
                std::thread::spawn(move || v.validate(&json!(i - 2)).len())
            })
            .collect();
        let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, [1, 1, 0, 0]);
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(
            join_relative("https://x.example/spec/a.json", "./b.json"),
            "https://x.example/spec/b.json"
        );
        assert_eq!(join_relative("urn:a", "b.json"), "b.json");
    }
}

//! Integration test: loader → registry → compiler → runner → reporter over
//! ad-hoc schema directories, including the setup failures each stage can
//! raise.

use std::path::Path;
use std::sync::OnceLock;

use proptest::prelude::*;
use sdt_schema::{
    compile, format_report, load_schema_dir, run, DocumentKind, SchemaCache, SchemaError,
    SchemaRegistry, SchemaValidator, ValidationOutcome, ValidatorConfig, Violation,
};
use serde_json::{json, Value};

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn write_json(dir: &Path, name: &str, schema: Value) {
    write(dir, name, &serde_json::to_string_pretty(&schema).unwrap());
}

#[test]
fn test_identifier_collision_names_both_files() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(tmp.path(), "a_rule.schema.json", json!({"$id": "urn:rule"}));
    write_json(tmp.path(), "rule.schema.json", json!({"$id": "urn:rule"}));

    let err = SchemaValidator::new(tmp.path()).unwrap_err();
    match &err {
        SchemaError::IdentifierCollision { key, first, second } => {
            assert_eq!(key, "urn:rule");
            assert_eq!(first, "a_rule.schema.json");
            assert_eq!(second, "rule.schema.json");
        }
        other => panic!("expected IdentifierCollision, got: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("a_rule.schema.json"));
    assert!(message.contains("rule.schema.json"));
    assert!(message.contains("urn:rule"));
}

#[test]
fn test_title_fallback_and_missing_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(tmp.path(), "event.schema.json", json!({"title": "Event", "type": "object"}));
    let validator = SchemaValidator::new(tmp.path()).unwrap();
    assert!(validator.get_schema("Event").is_some());

    write_json(tmp.path(), "nameless.schema.json", json!({"type": "object"}));
    let err = SchemaValidator::new(tmp.path()).unwrap_err();
    assert!(matches!(err, SchemaError::MissingIdentifier { ref file } if file == "nameless.schema.json"));
}

#[test]
fn test_malformed_schema_fails_whole_load() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(tmp.path(), "billing.schema.json", json!({"$id": "urn:billing"}));
    write(tmp.path(), "broken.schema.json", "{ not json");

    let err = load_schema_dir(tmp.path()).unwrap_err();
    match err {
        SchemaError::SchemaParse { path, .. } => assert!(path.ends_with("broken.schema.json")),
        other => panic!("expected SchemaParse, got: {other}"),
    }
}

#[test]
fn test_unknown_reference_is_named() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(
        tmp.path(),
        "rule.schema.json",
        json!({
            "$id": "urn:rule",
            "properties": {"owner": {"$ref": "urn:user"}}
        }),
    );
    let config = ValidatorConfig::new().with_schema_dir(tmp.path());
    let err = sdt_schema::validate_rule(&json!({}), &config).unwrap_err();
    assert!(!err.is_validation_failure());
    match err {
        SchemaError::UnresolvedReference { reference, .. } => assert_eq!(reference, "urn:user"),
        other => panic!("expected UnresolvedReference, got: {other}"),
    }
}

#[test]
fn test_cross_schema_reference_by_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(
        tmp.path(),
        "common.schema.json",
        json!({"$id": "urn:common", "$defs": {"positive": {"type": "number", "minimum": 0}}}),
    );
    write_json(
        tmp.path(),
        "billing.schema.json",
        json!({
            "$id": "urn:billing",
            "type": "object",
            "properties": {"amount": {"$ref": "urn:common#/$defs/positive"}}
        }),
    );

    let registry = SchemaRegistry::build(load_schema_dir(tmp.path()).unwrap()).unwrap();
    let target = registry.entry("urn:billing").unwrap();
    let validator = compile(&registry, target).unwrap();

    assert!(run(&validator, &json!({"amount": 3})).is_valid());
    let outcome = run(&validator, &json!({"amount": -5}));
    assert_eq!(
        format_report("Billing", &outcome),
        "Billing failed schema validation.\n- must be >= 0 at '/amount'"
    );
}

#[test]
fn test_compiled_validator_shared_across_threads() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(
        tmp.path(),
        "billing.schema.json",
        json!({"$id": "urn:billing", "properties": {"amount": {"minimum": 0}}}),
    );
    let validator = SchemaValidator::new(tmp.path()).unwrap();
    let compiled = validator.validator_for(DocumentKind::Billing).unwrap();

    std::thread::scope(|s| {
        for i in 0..4 {
            let compiled = compiled.clone();
            s.spawn(move || {
                let outcome = compiled.validate(&json!({"amount": -i - 1}));
                assert_eq!(outcome.len(), 1);
            });
        }
    });
}

#[test]
fn test_global_cache_serves_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(tmp.path(), "event.schema.json", json!({"$id": "urn:event"}));

    let cache = SchemaCache::global();
    let session = cache.get(tmp.path()).unwrap();
    session.validate(DocumentKind::Event, &json!({})).unwrap();
    assert!(cache.invalidate(tmp.path()));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn billing_session() -> &'static SchemaValidator {
    static SESSION: OnceLock<(tempfile::TempDir, SchemaValidator)> = OnceLock::new();
    let (_, session) = SESSION.get_or_init(|| {
        let tmp = tempfile::tempdir().unwrap();
        write_json(
            tmp.path(),
            "billing.schema.json",
            json!({
                "$id": "urn:billing",
                "type": "object",
                "required": ["transaction_id"],
                "properties": {
                    "transaction_id": {"type": "string"},
                    "amount": {"type": "integer", "minimum": 0}
                }
            }),
        );
        let session = SchemaValidator::new(tmp.path()).unwrap();
        (tmp, session)
    });
    session
}

fn line_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _<>=']{1,24}"
}

proptest! {
    #[test]
    fn prop_report_has_one_line_per_violation(
        label in "[A-Z][a-z]{2,10}",
        entries in prop::collection::vec((line_text(), "(/[a-z0-9]{1,6}){0,3}"), 1..8),
    ) {
        let violations: Vec<Violation> = entries
            .iter()
            .map(|(message, path)| Violation::new(message.clone(), path.clone()))
            .collect();
        let report = format_report(&label, &ValidationOutcome::new(violations));

        let lines: Vec<&str> = report.split('\n').collect();
        prop_assert_eq!(lines.len(), entries.len() + 1);
        prop_assert_eq!(lines[0], format!("{label} failed schema validation."));
        for (line, (message, path)) in lines[1..].iter().zip(&entries) {
            let expected = if path.is_empty() {
                format!("- {message}")
            } else {
                format!("- {message} at '{path}'")
            };
            prop_assert_eq!(*line, expected);
        }
    }

    #[test]
    fn prop_validation_is_idempotent(amount in -1_000i64..1_000, with_id in any::<bool>()) {
        let session = billing_session();
        let mut doc = json!({"amount": amount});
        if with_id {
            doc["transaction_id"] = json!("txn_1");
        }

        let first = session.check(DocumentKind::Billing, &doc).unwrap();
        let second = session.check(DocumentKind::Billing, &doc).unwrap();
        prop_assert_eq!(&first, &second);

        let expected = usize::from(amount < 0) + usize::from(!with_id);
        prop_assert_eq!(first.len(), expected);
    }
}

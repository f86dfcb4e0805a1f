//! # Cross-Reference Checks
//!
//! Semantic checks that JSON Schema cannot express because they span two
//! documents, or relate one part of a document to another:
//!
//! - an agent's `template_id` and capability fields must exist in its template;
//! - a rule's `template_id` and condition fields must exist in its template;
//! - a template's metric formulas may only name the template's own fields
//!   (or other metrics).
//!
//! Each check returns a [`ValidationOutcome`] so that failures are reported
//! with the same bullet format as schema violations.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::ValidatorConfig;
use crate::error::SchemaError;
use crate::kinds::DocumentKind;
use crate::report::{ensure_stage, FailureStage};
use crate::runner::{ValidationOutcome, Violation};
use crate::validate::validate_document;

/// Words that may appear in a formula without naming a field: boolean
/// operators, literals, and the conditional/membership keywords.
const FORMULA_RESERVED: &[&str] = &[
    "and", "or", "not", "true", "false", "null", "if", "then", "else", "in", "is",
];

/// Validate an agent against its schema, then against `template`.
pub fn validate_agent_with_template(
    agent: &Value,
    template: &Value,
    config: &ValidatorConfig,
) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Agent, agent, config)?;
    ensure_stage(
        DocumentKind::Agent.label(),
        FailureStage::CrossReference,
        agent_references(agent, template),
    )?;
    Ok(())
}

/// Validate a rule against its schema, then against `template`.
pub fn validate_rule_with_template(
    rule: &Value,
    template: &Value,
    config: &ValidatorConfig,
) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Rule, rule, config)?;
    ensure_stage(
        DocumentKind::Rule.label(),
        FailureStage::CrossReference,
        rule_references(rule, template),
    )?;
    Ok(())
}

/// Check an agent's `template_id` and `capabilities[].field` against `template`.
pub fn agent_references(agent: &Value, template: &Value) -> ValidationOutcome {
    let mut violations = Vec::new();
    check_template_id("Agent", agent, template, &mut violations);
    check_field_refs(
        agent,
        "capabilities",
        "Capability",
        &field_keys(template),
        &mut violations,
    );
    ValidationOutcome::new(violations)
}

/// Check a rule's `template_id` and `conditions[].field` against `template`.
pub fn rule_references(rule: &Value, template: &Value) -> ValidationOutcome {
    let mut violations = Vec::new();
    check_template_id("Rule", rule, template, &mut violations);
    check_field_refs(
        rule,
        "conditions",
        "Condition",
        &field_keys(template),
        &mut violations,
    );
    ValidationOutcome::new(violations)
}

/// Check that every identifier in each `metrics[].formula` names a field key
/// or another metric key of the same template.
pub fn template_metric_references(template: &Value) -> ValidationOutcome {
    let mut known = field_keys(template);
    let metrics = items(template, "metrics");
    known.extend(metrics.iter().filter_map(|m| str_field(m, "key")));

    let mut violations = Vec::new();
    for (idx, metric) in metrics.iter().enumerate() {
        let Some(formula) = str_field(metric, "formula") else {
            continue;
        };
        for name in formula_identifiers(formula) {
            if !known.contains(name) {
                violations.push(Violation::new(
                    format!("Metric[{idx}].formula references unknown field '{name}'"),
                    format!("/metrics/{idx}/formula"),
                ));
            }
        }
    }
    ValidationOutcome::new(violations)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_template_id(label: &str, document: &Value, template: &Value, acc: &mut Vec<Violation>) {
    let referenced = str_field(document, "template_id");
    let actual = str_field(template, "id");
    if referenced != actual {
        acc.push(Violation::new(
            format!(
                "{label} references template_id '{}', but provided template has id '{}'",
                referenced.unwrap_or_default(),
                actual.unwrap_or_default()
            ),
            "/template_id",
        ));
    }
}

fn check_field_refs(
    document: &Value,
    array: &str,
    item_label: &str,
    known: &BTreeSet<&str>,
    acc: &mut Vec<Violation>,
) {
    for (idx, item) in items(document, array).iter().enumerate() {
        let Some(field) = str_field(item, "field") else {
            continue;
        };
        if !known.contains(field) {
            let available = if known.is_empty() {
                "none".to_string()
            } else {
                known.iter().copied().collect::<Vec<_>>().join(", ")
            };
            acc.push(Violation::new(
                format!(
                    "{item_label}[{idx}].field '{field}' does not exist in template. \
                     Available fields: {available}"
                ),
                format!("/{array}/{idx}/field"),
            ));
        }
    }
}

fn field_keys(template: &Value) -> BTreeSet<&str> {
    items(template, "fields")
        .iter()
        .filter_map(|f| str_field(f, "key"))
        .filter(|k| !k.is_empty())
        .collect()
}

fn items<'a>(document: &'a Value, key: &str) -> &'a [Value] {
    document
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Identifiers in a formula that are not function calls, numbers, string
/// literals, or reserved words, in order of first appearance.
fn formula_identifiers(formula: &str) -> Vec<&str> {
    let bytes = formula.as_bytes();
    let mut names: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                i += 1;
            }
            i += 1;
        } else if b.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let name = &formula[start..i];

            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let is_call = j < bytes.len() && bytes[j] == b'(';

            if !is_call && !FORMULA_RESERVED.contains(&name) && !names.contains(&name) {
                names.push(name);
            }
        } else {
            i += 1;
        }
    }
    names
}

//! # Validation Runner
//!
//! Executes a compiled validator against one document in collect-all mode and
//! returns every violation in the engine's traversal order.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::compiler::CompiledValidator;
use crate::engine::ValidationEngine;

/// A single constraint failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Human-readable description.
    pub message: String,
    /// JSON Pointer to the failing value; empty for the document root.
    pub instance_path: String,
    /// The keyword that failed (`minimum`, `required`, ...), when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// JSON Pointer into the schema that produced the failure.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_path: String,
}

impl Violation {
    /// A violation with no keyword or schema location, as produced by the
    /// semantic checks that run after schema validation.
    pub fn new(message: impl Into<String>, instance_path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            instance_path: instance_path.into(),
            keyword: None,
            schema_path: String::new(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} at '{}'", self.message, self.instance_path)
        }
    }
}

/// Outcome of one validation run. Valid iff there are no violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Run `validator` against `instance`, collecting every violation.
pub fn run<E: ValidationEngine>(
    validator: &CompiledValidator<E>,
    instance: &Value,
) -> ValidationOutcome {
    let violations = E::run(validator.inner(), instance);
    for violation in &violations {
        tracing::trace!(
            schema = validator.schema_key(),
            path = %violation.instance_path,
            keyword = violation.keyword.as_deref().unwrap_or(""),
            "{}",
            violation.message
        );
    }
    ValidationOutcome::new(violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_with_path() {
        let v = Violation::new("must be >= 0", "/amount");
        assert_eq!(v.to_string(), "must be >= 0 at '/amount'");
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation::new("must have required property 'name'", "");
        assert_eq!(v.to_string(), "must have required property 'name'");
    }

    #[test]
    fn test_outcome_validity() {
        assert!(ValidationOutcome::default().is_valid());
        let outcome = ValidationOutcome::new(vec![Violation::new("boom", "")]);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.into_violations()[0].message, "boom");
    }

    #[test]
    fn test_violation_serializes_without_empty_fields() {
        let v = Violation::new("must be string", "/name");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "must be string", "instance_path": "/name"})
        );
    }
}

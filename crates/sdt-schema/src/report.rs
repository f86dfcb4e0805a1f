//! # Error Reporter
//!
//! Renders a validation outcome as the one user-visible artifact of the
//! crate:
//!
//! ```text
//! Billing failed schema validation.
//! - must be >= 0 at '/amount'
//! ```
//!
//! The heading names the caller's label. Each violation is one `- ` line; the
//! ` at '<path>'` suffix appears only when the instance path is non-empty.
//! Text is concatenated verbatim, with no escaping.

use std::fmt;

use crate::runner::{ValidationOutcome, Violation};

/// Which check produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// JSON Schema validation.
    Schema,
    /// Semantic checks between related documents.
    CrossReference,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Schema => "schema",
            FailureStage::CrossReference => "cross-reference",
        }
    }
}

/// A document that failed validation, with every violation found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    label: String,
    stage: FailureStage,
    violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(label: impl Into<String>, stage: FailureStage, violations: Vec<Violation>) -> Self {
        Self {
            label: label.into(),
            stage,
            violations,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stage(&self) -> FailureStage {
        self.stage
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed {} validation.", self.label, self.stage.as_str())?;
        for violation in &self.violations {
            write!(f, "\n- {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Render `outcome` under `label` as a schema-validation report.
pub fn format_report(label: &str, outcome: &ValidationOutcome) -> String {
    ValidationFailure::new(label, FailureStage::Schema, outcome.violations().to_vec()).to_string()
}

/// `Ok(())` for a valid outcome, otherwise the failure carrying the report.
pub fn ensure_valid(label: &str, outcome: ValidationOutcome) -> Result<(), ValidationFailure> {
    ensure_stage(label, FailureStage::Schema, outcome)
}

pub(crate) fn ensure_stage(
    label: &str,
    stage: FailureStage,
    outcome: ValidationOutcome,
) -> Result<(), ValidationFailure> {
    if outcome.is_valid() {
        Ok(())
    } else {
        Err(ValidationFailure::new(label, stage, outcome.into_violations()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_single_violation() {
        let outcome = ValidationOutcome::new(vec![Violation::new("must be >= 0", "/amount")]);
        assert_eq!(
            format_report("Billing", &outcome),
            "Billing failed schema validation.\n- must be >= 0 at '/amount'"
        );
    }

    #[test]
    fn test_root_violation_has_no_location() {
        let outcome = ValidationOutcome::new(vec![
            Violation::new("must have required property 'name'", ""),
            Violation::new("must be string", "/id"),
        ]);
        assert_eq!(
            format_report("Template", &outcome),
            "Template failed schema validation.\n\
             - must have required property 'name'\n\
             - must be string at '/id'"
        );
    }

    #[test]
    fn test_heading_only_without_violations() {
        assert_eq!(
            format_report("Rule", &ValidationOutcome::default()),
            "Rule failed schema validation."
        );
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid("Event", ValidationOutcome::default()).is_ok());

        let failure = ensure_valid(
            "Event",
            ValidationOutcome::new(vec![Violation::new("must be boolean", "/privacy/consent")]),
        )
        .unwrap_err();
        assert_eq!(failure.label(), "Event");
        assert_eq!(failure.stage(), FailureStage::Schema);
        assert_eq!(failure.violations().len(), 1);
    }

    #[test]
    fn test_cross_reference_heading() {
        let failure = ValidationFailure::new(
            "Agent",
            FailureStage::CrossReference,
            vec![Violation::new("unknown field", "/capabilities/0/field")],
        );
        assert_eq!(
            failure.to_string(),
            "Agent failed cross-reference validation.\n- unknown field at '/capabilities/0/field'"
        );
    }

    #[test]
    fn test_no_escaping() {
        let outcome =
            ValidationOutcome::new(vec![Violation::new("must match pattern \"^'x'$\"", "/a b")]);
        assert_eq!(
            format_report("Project", &outcome),
            "Project failed schema validation.\n- must match pattern \"^'x'$\" at '/a b'"
        );
    }
}

//! Violation messages.
//!
//! Messages are rendered from the engine's structured error kind in a terse,
//! instance-independent "must ..." style (`must be >= 0`,
//! `must have required property 'name'`). The offending value is never
//! echoed; the instance path already says where the problem is. Kinds with no
//! dedicated phrasing fall back to the engine's own text.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;

pub(crate) fn render(error: &ValidationError<'_>) -> String {
    match &error.kind {
        ValidationErrorKind::Required { property } => match property.as_str() {
            Some(name) => format!("must have required property '{name}'"),
            None => format!("must have required property '{property}'"),
        },
        ValidationErrorKind::Type {
            kind: TypeKind::Single(ty),
        } => format!("must be {ty}"),
        ValidationErrorKind::Type {
            kind: TypeKind::Multiple(types),
        } => {
            let names: Vec<String> = (*types).into_iter().map(|ty| ty.to_string()).collect();
            format!("must be {}", names.join(","))
        }
        ValidationErrorKind::Minimum { limit } => format!("must be >= {limit}"),
        ValidationErrorKind::Maximum { limit } => format!("must be <= {limit}"),
        ValidationErrorKind::ExclusiveMinimum { limit } => format!("must be > {limit}"),
        ValidationErrorKind::ExclusiveMaximum { limit } => format!("must be < {limit}"),
        ValidationErrorKind::MultipleOf { multiple_of } => {
            format!("must be multiple of {multiple_of}")
        }
        ValidationErrorKind::MinLength { limit } => {
            format!("must NOT have fewer than {limit} characters")
        }
        ValidationErrorKind::MaxLength { limit } => {
            format!("must NOT have more than {limit} characters")
        }
        ValidationErrorKind::MinItems { limit } => format!("must NOT have fewer than {limit} items"),
        ValidationErrorKind::MaxItems { limit } => format!("must NOT have more than {limit} items"),
        ValidationErrorKind::MinProperties { limit } => {
            format!("must NOT have fewer than {limit} properties")
        }
        ValidationErrorKind::MaxProperties { limit } => {
            format!("must NOT have more than {limit} properties")
        }
        ValidationErrorKind::Pattern { pattern } => format!("must match pattern \"{pattern}\""),
        ValidationErrorKind::Format { format } => format!("must match format \"{format}\""),
        ValidationErrorKind::Enum { .. } => "must be equal to one of the allowed values".to_string(),
        ValidationErrorKind::Constant { .. } => "must be equal to constant".to_string(),
        ValidationErrorKind::AdditionalProperties { .. } => {
            "must NOT have additional properties".to_string()
        }
        ValidationErrorKind::UnevaluatedProperties { .. } => {
            "must NOT have unevaluated properties".to_string()
        }
        ValidationErrorKind::AnyOf { .. } => "must match a schema in anyOf".to_string(),
        ValidationErrorKind::OneOfNotValid { .. } | ValidationErrorKind::OneOfMultipleValid { .. } => {
            "must match exactly one schema in oneOf".to_string()
        }
        ValidationErrorKind::Not { .. } => "must NOT be valid".to_string(),
        ValidationErrorKind::UniqueItems { .. } => "must NOT have duplicate items".to_string(),
        ValidationErrorKind::Contains { .. } => "must contain at least 1 valid item".to_string(),
        ValidationErrorKind::FalseSchema { .. } => "boolean schema is false".to_string(),
        _ => error.to_string(),
    }
}

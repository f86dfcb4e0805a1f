//! # sdt-schema — Document Schema Validation
//!
//! Validates SDT documents (templates, rules, agents, projects, executions,
//! events, billing records) against the JSON Schemas in a schema directory.
//!
//! ## Pipeline
//!
//! 1. [`loader`] reads every `*.json` file of the directory.
//! 2. [`registry`] indexes them by `$id` (or `title`) and rejects collisions.
//! 3. [`compiler`] registers the whole registry with a [`ValidationEngine`]
//!    so cross-file `$ref`s resolve, and compiles one target schema.
//! 4. [`runner`] applies a compiled validator and collects every violation.
//! 5. [`report`] turns a failed outcome into a [`ValidationFailure`] with a
//!    stable, line-oriented message.
//!
//! [`validate`] exposes the seven per-kind operations on top of this
//! pipeline; [`crossref`] adds the checks that span two documents, and
//! [`cache`] reuses sessions across calls for long-running processes.
//!
//! ## Crate Policy
//!
//! - Schema files are read-only inputs. Identifiers are never rewritten.
//! - The environment is read only through [`ValidatorConfig::from_env`].
//! - Validation never stops at the first violation.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod crossref;
pub mod engine;
pub mod error;
pub mod kinds;
pub mod loader;
mod messages;
pub mod registry;
pub mod report;
pub mod runner;
pub mod validate;

pub use cache::SchemaCache;
pub use compiler::{compile, compile_with, CompiledValidator};
pub use config::{ValidatorConfig, DEFAULT_SPEC_DIR, SPEC_DIR_ENV};
pub use crossref::{
    agent_references, rule_references, template_metric_references, validate_agent_with_template,
    validate_rule_with_template,
};
pub use engine::{EngineOptions, JsonSchemaEngine, ValidationEngine};
pub use error::SchemaError;
pub use kinds::{DocumentKind, UnknownKind};
pub use loader::{load_document, load_schema_dir, LoadedSchema};
pub use registry::{RegisteredSchema, SchemaRegistry};
pub use report::{ensure_valid, format_report, FailureStage, ValidationFailure};
pub use runner::{run, ValidationOutcome, Violation};
pub use validate::{
    validate_agent, validate_billing, validate_document, validate_event, validate_execution,
    validate_project, validate_rule, validate_template, SchemaValidator,
};

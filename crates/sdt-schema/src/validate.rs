//! # Document Validation
//!
//! Ties the pipeline together: load → registry → compile → run → report.
//!
//! ## Design
//!
//! [`SchemaValidator`] is a session over one schema directory. It loads and
//! indexes every schema at construction time and memoises the compiled
//! validator for each schema file on first use. The free functions
//! ([`validate_template`], [`validate_rule`], ...) build a fresh session per
//! call, so they never observe stale schemas; long-running callers that
//! validate many documents should hold a session or go through
//! [`SchemaCache`](crate::cache::SchemaCache).
//!
//! ## Thread safety
//!
//! `SchemaValidator` is `Send + Sync`. The memo table is the only mutable
//! state and is guarded by a `parking_lot` mutex that is never held while
//! compiling or validating.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use crate::compiler::{compile_with, CompiledValidator};
use crate::config::ValidatorConfig;
use crate::crossref;
use crate::engine::{EngineOptions, JsonSchemaEngine};
use crate::error::SchemaError;
use crate::kinds::DocumentKind;
use crate::loader::{load_document, load_schema_dir};
use crate::registry::SchemaRegistry;
use crate::report::{ensure_stage, ensure_valid, FailureStage};
use crate::runner::ValidationOutcome;

// ---------------------------------------------------------------------------
// SchemaValidator
// ---------------------------------------------------------------------------

/// Validates documents against the schemas of one directory.
pub struct SchemaValidator {
    /// The directory the schemas were loaded from.
    schema_dir: PathBuf,
    /// Every schema in the directory, keyed by identifier.
    registry: SchemaRegistry,
    options: EngineOptions,
    /// Compiled validators by schema file name.
    compiled: Mutex<HashMap<String, CompiledValidator>>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_dir", &self.schema_dir)
            .field("schema_count", &self.registry.len())
            .field("compiled", &self.compiled.lock().len())
            .finish()
    }
}

impl SchemaValidator {
    /// Load every schema in `schema_dir` and build the registry.
    ///
    /// # Errors
    ///
    /// Any loader or registry error: missing directory, malformed schema
    /// file, schema without identifier, identifier collision.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        Self::with_options(schema_dir, EngineOptions::default())
    }

    /// Like [`new`](Self::new), with explicit engine options.
    pub fn with_options(
        schema_dir: impl Into<PathBuf>,
        options: EngineOptions,
    ) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.into();
        let registry = SchemaRegistry::build(load_schema_dir(&schema_dir)?)?;

        Ok(Self {
            schema_dir,
            registry,
            options,
            compiled: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Returns the number of schemas loaded into the registry.
    pub fn schema_count(&self) -> usize {
        self.registry.len()
    }

    /// Look up a schema by its identifier.
    pub fn get_schema(&self, key: &str) -> Option<&Value> {
        self.registry.lookup(key)
    }

    /// The compiled validator for a schema file, compiling it on first use.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaNotFound`] if no schema was loaded from
    /// `schema_file`; otherwise any compilation error.
    pub fn validator_for_file(&self, schema_file: &str) -> Result<CompiledValidator, SchemaError> {
        if let Some(validator) = self.compiled.lock().get(schema_file) {
            return Ok(validator.clone());
        }

        let target =
            self.registry
                .by_source(schema_file)
                .ok_or_else(|| SchemaError::SchemaNotFound {
                    path: self.schema_dir.join(schema_file),
                })?;
        let validator = compile_with(JsonSchemaEngine::new(self.options), &self.registry, target)?;

        self.compiled
            .lock()
            .entry(schema_file.to_string())
            .or_insert_with(|| validator.clone());
        Ok(validator)
    }

    /// The compiled validator for a document kind.
    pub fn validator_for(&self, kind: DocumentKind) -> Result<CompiledValidator, SchemaError> {
        self.validator_for_file(kind.schema_file())
    }

    /// Run the kind's schema against `document` without turning violations
    /// into an error.
    pub fn check(
        &self,
        kind: DocumentKind,
        document: &Value,
    ) -> Result<ValidationOutcome, SchemaError> {
        Ok(self.validator_for(kind)?.validate(document))
    }

    /// Validate `document` as `kind`.
    ///
    /// Templates additionally have their metric formulas checked against the
    /// template's own field keys once the schema passes.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ValidationFailed`] listing every violation, or a setup
    /// error if the schema cannot be found or compiled.
    pub fn validate(&self, kind: DocumentKind, document: &Value) -> Result<(), SchemaError> {
        let outcome = self.check(kind, document)?;
        tracing::debug!(
            kind = %kind,
            violations = outcome.len(),
            "validated document"
        );
        ensure_valid(kind.label(), outcome)?;

        if kind == DocumentKind::Template {
            ensure_stage(
                kind.label(),
                FailureStage::CrossReference,
                crossref::template_metric_references(document),
            )?;
        }
        Ok(())
    }

    /// Load a JSON or YAML document from `path` and validate it as `kind`.
    pub fn validate_file(&self, kind: DocumentKind, path: &Path) -> Result<(), SchemaError> {
        let document = load_document(path)?;
        self.validate(kind, &document)
    }
}

// ---------------------------------------------------------------------------
// Per-kind operations
// ---------------------------------------------------------------------------

/// Validate `document` as `kind` against the configured schema directory.
///
/// Loads and compiles the schemas fresh for this call.
pub fn validate_document(
    kind: DocumentKind,
    document: &Value,
    config: &ValidatorConfig,
) -> Result<(), SchemaError> {
    SchemaValidator::new(config.resolve_schema_dir())?.validate(kind, document)
}

/// Validate a template against `template.schema.json`.
pub fn validate_template(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Template, document, config)
}

/// Validate a rule against `rule.schema.json`.
pub fn validate_rule(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Rule, document, config)
}

/// Validate an agent against `agent.schema.json`.
pub fn validate_agent(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Agent, document, config)
}

/// Validate a project against `project.schema.json`.
pub fn validate_project(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Project, document, config)
}

/// Validate an execution record against `execution.schema.json`.
pub fn validate_execution(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Execution, document, config)
}

/// Validate an event against `event.schema.json`.
pub fn validate_event(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Event, document, config)
}

/// Validate a billing record against `billing.schema.json`.
pub fn validate_billing(document: &Value, config: &ValidatorConfig) -> Result<(), SchemaError> {
    validate_document(DocumentKind::Billing, document, config)
}

//! # Constraint Engine
//!
//! The primitive JSON Schema keyword semantics are not implemented here. They
//! come from an engine behind the narrow [`ValidationEngine`] trait:
//! register every schema, compile one target, run it. [`JsonSchemaEngine`] is
//! the production implementation on top of the `jsonschema` crate.
//!
//! ## Reference resolution
//!
//! Every registered schema is handed to `jsonschema` as a resource before
//! compilation, under its `$id` and registry key when those are URIs and
//! under `json-schema:///<name>` for bare keys and file names. A local
//! retriever answers any remaining alias lookups, so `$ref` resolution never
//! touches the network. A reference that matches none of these fails
//! compilation.

use std::collections::HashMap;

use jsonschema::{Draft, Resource, Retrieve, Uri, Validator};
use serde_json::Value;

use crate::messages;
use crate::runner::Violation;

/// Base URI `jsonschema` assigns to schemas that declare no `$id`.
pub(crate) const DEFAULT_BASE_URI: &str = "json-schema:///";

/// The capability the compiler consumes.
///
/// Implementations hold the registered schemas until [`compile`] is called;
/// the compiled artifact must be self-contained, immutable, and safe to run
/// from many threads at once.
///
/// [`compile`]: ValidationEngine::compile
pub trait ValidationEngine {
    /// Compiled, reusable validator.
    type Compiled: Send + Sync + 'static;

    /// Make `schema` resolvable by `key` and by its `source` file name.
    fn register_schema(&mut self, key: &str, source: &str, schema: &Value);

    /// Compile `schema` with every registered schema available for `$ref`s.
    fn compile(&self, schema: &Value) -> Result<Self::Compiled, String>;

    /// Check `instance`, returning every violation in traversal order.
    fn run(compiled: &Self::Compiled, instance: &Value) -> Vec<Violation>;
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Treat `format` as an assertion (`date-time`, `email`, ...) rather than
    /// an annotation.
    pub validate_formats: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            validate_formats: true,
        }
    }
}

/// [`ValidationEngine`] backed by the `jsonschema` crate (Draft 2020-12).
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaEngine {
    options: EngineOptions,
    /// URI or alias → schema document.
    resources: HashMap<String, Value>,
    /// Absolute URI → schema document, preloaded into the engine registry.
    preloaded: HashMap<String, Value>,
}

impl JsonSchemaEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            resources: HashMap::new(),
            preloaded: HashMap::new(),
        }
    }

    /// Number of names (URIs and aliases) the retriever will answer for.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

impl ValidationEngine for JsonSchemaEngine {
    type Compiled = Validator;

    fn register_schema(&mut self, key: &str, source: &str, schema: &Value) {
        for name in [key, source] {
            self.resources.insert(name.to_string(), schema.clone());
            if !has_uri_scheme(name) {
                self.resources
                    .insert(format!("{DEFAULT_BASE_URI}{name}"), schema.clone());
            }
        }

        let declared_id = schema.get("$id").and_then(Value::as_str);
        for name in declared_id.into_iter().chain([key, source]) {
            if let Some(uri) = resource_uri(name) {
                self.preloaded.entry(uri).or_insert_with(|| schema.clone());
            }
        }
    }

    fn compile(&self, schema: &Value) -> Result<Validator, String> {
        let retriever = LocalSchemaRetriever {
            schemas: self.resources.clone(),
        };

        let mut options = jsonschema::options();
        options
            .with_draft(Draft::Draft202012)
            .should_validate_formats(self.options.validate_formats)
            .with_retriever(retriever);
        for (uri, document) in &self.preloaded {
            let resource = Resource::from_contents(document.clone())
                .map_err(|e| format!("cannot register {uri}: {e}"))?;
            options.with_resource(uri.as_str(), resource);
        }

        options.build(schema).map_err(|e| e.to_string())
    }

    fn run(compiled: &Validator, instance: &Value) -> Vec<Violation> {
        compiled
            .iter_errors(instance)
            .map(|error| {
                let schema_path = error.schema_path.to_string();
                Violation {
                    message: messages::render(&error),
                    instance_path: error.instance_path.to_string(),
                    keyword: keyword_at(&schema_path),
                    schema_path,
                }
            })
            .collect()
    }
}

/// The keyword is the last segment of the schema path.
fn keyword_at(schema_path: &str) -> Option<String> {
    schema_path
        .rsplit('/')
        .next()
        .filter(|k| !k.is_empty() && !k.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

/// The absolute URI a registered name is preloaded under, if it can be one.
///
/// Names with a scheme are used as-is; bare names go under the default base.
/// Names with characters that are not valid in a URI (spaces in a `title`,
/// for instance) are left to the retriever.
fn resource_uri(name: &str) -> Option<String> {
    let valid = !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b':' | b'/' | b'@')
        });
    if !valid {
        return None;
    }
    if has_uri_scheme(name) {
        Some(name.to_string())
    } else {
        Some(format!("{DEFAULT_BASE_URI}{name}"))
    }
}

/// Whether `s` starts with an RFC 3986 scheme (`urn:`, `https:`, ...).
pub(crate) fn has_uri_scheme(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Retriever
// ---------------------------------------------------------------------------

/// Resolves `$ref` URIs against the registered schemas only.
struct LocalSchemaRetriever {
    schemas: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas.get(uri_str) {
            return Ok(value.clone());
        }

        // Relative refs from schemas without `$id` arrive under the default base.
        let bare = uri_str.strip_prefix(DEFAULT_BASE_URI).unwrap_or(uri_str);
        if let Some(value) = self.schemas.get(bare) {
            return Ok(value.clone());
        }

        // Relative refs resolved against another schema's `$id` end in a file name.
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas.get(filename) {
            return Ok(value.clone());
        }

        Err(format!("schema not found for URI: {uri_str}").into())
    }
}

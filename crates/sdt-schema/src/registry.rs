//! # Schema Registry
//!
//! Indexes loaded schemas by identifier so that cross-schema `$ref`s can be
//! resolved. The key is the schema's `$id`, falling back to its `title`. A
//! schema with neither is rejected, and so is a second schema claiming a key
//! that is already taken: collisions are never resolved by overwriting.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::SchemaError;
use crate::loader::LoadedSchema;

/// A registered schema: its key, provenance, and document.
#[derive(Debug, Clone)]
pub struct RegisteredSchema {
    /// Identifier the schema is registered under.
    pub key: String,
    /// Source file name.
    pub source: String,
    /// Parsed schema document.
    pub document: Value,
}

/// Lookup of schema documents keyed by identifier.
///
/// Entries keep the order they were built in, which is the loader's
/// file-name order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: Vec<RegisteredSchema>,
    by_key: HashMap<String, usize>,
    by_source: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a registry from loaded schemas, processed in the given order.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::MissingIdentifier`] if a schema has neither a
    ///   non-empty `$id` nor a `title`.
    /// - [`SchemaError::IdentifierCollision`] if two schemas share a key.
    pub fn build(documents: Vec<LoadedSchema>) -> Result<Self, SchemaError> {
        let mut registry = Self::default();

        for schema in documents {
            let key = schema
                .declared_id()
                .or_else(|| schema.declared_title())
                .map(str::to_string);
            let Some(key) = key else {
                return Err(SchemaError::MissingIdentifier {
                    file: schema.source,
                });
            };

            if let Some(&existing) = registry.by_key.get(&key) {
                return Err(SchemaError::IdentifierCollision {
                    key,
                    first: registry.entries[existing].source.clone(),
                    second: schema.source,
                });
            }

            let index = registry.entries.len();
            registry.by_key.insert(key.clone(), index);
            registry.by_source.insert(schema.source.clone(), index);
            registry.entries.push(RegisteredSchema {
                key,
                source: schema.source,
                document: schema.document,
            });
        }

        tracing::debug!(schemas = registry.len(), "built schema registry");
        Ok(registry)
    }

    /// Look up a schema document by identifier.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|e| &e.document)
    }

    /// Look up the full registry entry by identifier.
    pub fn entry(&self, key: &str) -> Option<&RegisteredSchema> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// Look up the entry loaded from a given file name.
    pub fn by_source(&self, source: &str) -> Option<&RegisteredSchema> {
        self.by_source.get(source).map(|&i| &self.entries[i])
    }

    /// All registered schemas, in build order.
    pub fn all(&self) -> &[RegisteredSchema] {
        &self.entries
    }

    /// All registry keys, in build order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

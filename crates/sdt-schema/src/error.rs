//! # Error Types
//!
//! A single error enum covers every way a validation call can end other than
//! success. Setup faults (I/O, parse, registry, compilation) abort the call
//! with a message qualified by the offending file or identifier. A document
//! that simply violates its schema is reported through
//! [`SchemaError::ValidationFailed`], whose `Display` is the rendered report
//! and nothing else.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::ValidationFailure;

/// Errors returned by schema loading, compilation, and validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A directory or file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A schema file is not well-formed JSON.
    #[error("failed to parse schema {}: {reason}", path.display())]
    SchemaParse {
        /// Path of the malformed schema file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// An input document could not be read or parsed.
    #[error("failed to load document {}: {reason}", path.display())]
    DocumentLoad {
        /// Path of the document.
        path: PathBuf,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A schema declares neither `$id` nor `title`.
    #[error("schema missing identifier: {file} declares neither a non-empty $id nor a title")]
    MissingIdentifier {
        /// Source file name of the schema.
        file: String,
    },

    /// Two schemas resolve to the same registry key.
    #[error("schema identifier collision: '{key}' is declared by both {first} and {second}")]
    IdentifierCollision {
        /// The colliding identifier.
        key: String,
        /// Source file that registered the key first.
        first: String,
        /// Source file that attempted to register it again.
        second: String,
    },

    /// The schema file bound to a document kind does not exist.
    #[error("schema file not found: {}", path.display())]
    SchemaNotFound {
        /// Expected location of the schema file.
        path: PathBuf,
    },

    /// The target schema `$ref`s an identifier absent from the registry.
    #[error("schema {schema} references unknown identifier '{reference}'")]
    UnresolvedReference {
        /// Registry key of the referencing schema.
        schema: String,
        /// The `$ref` value that could not be resolved.
        reference: String,
    },

    /// The engine rejected the target schema.
    #[error("failed to compile schema {schema}: {reason}")]
    Compile {
        /// Registry key of the schema.
        schema: String,
        /// Engine diagnostic.
        reason: String,
    },

    /// The document does not conform to its schema.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationFailure),
}

impl SchemaError {
    /// Returns `true` for the expected "document is invalid" outcome, as
    /// opposed to a setup fault.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, SchemaError::ValidationFailed(_))
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation_failure(&self) -> Option<&ValidationFailure> {
        match self {
            SchemaError::ValidationFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

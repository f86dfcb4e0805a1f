//! # Schema Loader
//!
//! Reads every `*.json` file in a schema directory and parses it into a
//! [`LoadedSchema`]. The load is all-or-nothing: one malformed file fails the
//! whole directory. Results are sorted by file name so that registry
//! diagnostics are reproducible regardless of directory iteration order.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SchemaError;

/// Extension recognised as a schema definition file.
pub const SCHEMA_EXTENSION: &str = "json";

/// A parsed schema document paired with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    /// File name within the schema directory (e.g. `rule.schema.json`).
    pub source: String,
    /// Parsed schema document.
    pub document: Value,
}

impl LoadedSchema {
    /// The non-empty `$id` declared by the schema, if any.
    pub fn declared_id(&self) -> Option<&str> {
        non_empty_str(&self.document, "$id")
    }

    /// The non-empty `title` declared by the schema, if any.
    pub fn declared_title(&self) -> Option<&str> {
        non_empty_str(&self.document, "title")
    }
}

fn non_empty_str<'a>(document: &'a Value, field: &str) -> Option<&'a str> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Load all schema definitions from `dir`.
///
/// # Errors
///
/// Returns [`SchemaError::Io`] if the directory or a file cannot be read, and
/// [`SchemaError::SchemaParse`] naming the file if any schema is not
/// well-formed JSON.
pub fn load_schema_dir(dir: &Path) -> Result<Vec<LoadedSchema>, SchemaError> {
    let mut schemas = Vec::new();
    for path in schema_files(dir)? {
        let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
            path: path.clone(),
            source,
        })?;

        let document: Value =
            serde_json::from_str(&content).map_err(|e| SchemaError::SchemaParse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        schemas.push(LoadedSchema { source, document });
    }

    tracing::debug!(
        dir = %dir.display(),
        count = schemas.len(),
        "loaded schema definitions"
    );
    Ok(schemas)
}

/// List the schema files in `dir`, sorted by file name.
pub(crate) fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let io_err = |source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == SCHEMA_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load an input document from disk.
///
/// `.yaml` and `.yml` files are parsed as YAML; anything else as JSON.
///
/// # Errors
///
/// Returns [`SchemaError::DocumentLoad`] if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::DocumentLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| SchemaError::DocumentLoad {
                path: path.to_path_buf(),
                reason: format!("YAML parse error: {e}"),
            })
        }
        _ => serde_json::from_str(&content).map_err(|e| SchemaError::DocumentLoad {
            path: path.to_path_buf(),
            reason: format!("JSON parse error: {e}"),
        }),
    }
}

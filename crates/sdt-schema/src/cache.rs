//! # Schema Cache
//!
//! Process-wide reuse of [`SchemaValidator`] sessions, keyed by the
//! canonical schema directory path. Every lookup re-lists the directory and
//! compares a fingerprint (file names, sizes, modification times); any
//! difference rebuilds the session, so edits to schema files are picked up
//! on the next call. Entries can also be dropped explicitly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::error::SchemaError;
use crate::loader::schema_files;
use crate::validate::SchemaValidator;

/// Snapshot of a schema directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint(Vec<(PathBuf, u64, Option<SystemTime>)>);

impl Fingerprint {
    fn of(dir: &Path) -> Result<Self, SchemaError> {
        let mut entries = Vec::new();
        for path in schema_files(dir)? {
            let meta = std::fs::metadata(&path).map_err(|source| SchemaError::Io {
                path: path.clone(),
                source,
            })?;
            entries.push((path, meta.len(), meta.modified().ok()));
        }
        Ok(Self(entries))
    }
}

struct CacheEntry {
    fingerprint: Fingerprint,
    validator: Arc<SchemaValidator>,
}

/// Cache of schema sessions by directory.
#[derive(Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("directories", &self.entries.read().len())
            .finish()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide cache.
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// The session for `dir`, rebuilt if the directory changed since it was
    /// cached.
    ///
    /// # Errors
    ///
    /// Any error from listing the directory or building the session.
    pub fn get(&self, dir: &Path) -> Result<Arc<SchemaValidator>, SchemaError> {
        let key = canonical(dir)?;
        let fingerprint = Fingerprint::of(&key)?;

        if let Some(entry) = self.entries.read().get(&key) {
            if entry.fingerprint == fingerprint {
                tracing::trace!(dir = %key.display(), "schema cache hit");
                return Ok(Arc::clone(&entry.validator));
            }
        }

        tracing::debug!(dir = %key.display(), "building schema session");
        let validator = Arc::new(SchemaValidator::new(&key)?);
        self.entries.write().insert(
            key,
            CacheEntry {
                fingerprint,
                validator: Arc::clone(&validator),
            },
        );
        Ok(validator)
    }

    /// Drop the session for `dir`. Returns whether one was cached.
    pub fn invalidate(&self, dir: &Path) -> bool {
        let key = canonical(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.entries.write().remove(&key).is_some()
    }

    /// Drop every cached session.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn canonical(dir: &Path) -> Result<PathBuf, SchemaError> {
    dir.canonicalize().map_err(|source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

//! # Configuration
//!
//! The schema directory is an explicit value threaded through every call.
//! Nothing in the library reads the environment implicitly;
//! [`ValidatorConfig::from_env`] exists for binaries that want the
//! `SDT_SPEC_DIR` convention.

use std::path::{Path, PathBuf};

/// Environment variable naming the schema directory.
pub const SPEC_DIR_ENV: &str = "SDT_SPEC_DIR";

/// Directory used when none is configured, relative to the working directory.
pub const DEFAULT_SPEC_DIR: &str = "spec";

/// Options for a validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Overrides the default schema directory (`./spec`).
    pub schema_dir: Option<PathBuf>,
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Configuration taken from `SDT_SPEC_DIR`, if set and non-empty.
    pub fn from_env() -> Self {
        let schema_dir = std::env::var_os(SPEC_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(|v| absolutize(Path::new(&v)));
        Self { schema_dir }
    }

    /// The directory this call loads schemas from.
    pub fn resolve_schema_dir(&self) -> PathBuf {
        match &self.schema_dir {
            Some(dir) => dir.clone(),
            None => absolutize(Path::new(DEFAULT_SPEC_DIR)),
        }
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

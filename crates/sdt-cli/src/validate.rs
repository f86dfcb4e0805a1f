//! # Validate Command
//!
//! Loads one document, validates it as the requested kind, and maps the
//! result to an exit code. With `--template`, agent and rule documents are
//! also checked against the template they reference.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use sdt_schema::{
    load_document, validate_agent_with_template, validate_document,
    validate_rule_with_template, DocumentKind, SchemaError, ValidationFailure, ValidatorConfig,
};

use crate::{EXIT_INVALID, EXIT_NOT_FOUND, EXIT_OK};

/// Arguments for `sdt-validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Kind of document to validate.
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Path to the JSON (or YAML) document.
    #[arg(value_name = "JSON_PATH")]
    pub json_path: PathBuf,

    /// Schema directory. Overrides SDT_SPEC_DIR; defaults to ./spec.
    #[arg(long, value_name = "DIR")]
    pub spec_dir: Option<PathBuf>,

    /// Template the agent or rule refers to; enables cross-reference checks.
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Print violations as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,
}

/// Document kinds accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Template,
    Rule,
    Agent,
    Project,
    Execution,
    Event,
    Billing,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Template => DocumentKind::Template,
            KindArg::Rule => DocumentKind::Rule,
            KindArg::Agent => DocumentKind::Agent,
            KindArg::Project => DocumentKind::Project,
            KindArg::Execution => DocumentKind::Execution,
            KindArg::Event => DocumentKind::Event,
            KindArg::Billing => DocumentKind::Billing,
        }
    }
}

/// Result of a validation run that completed.
#[derive(Debug)]
pub enum Verdict {
    Valid,
    Invalid(ValidationFailure),
    FileNotFound(PathBuf),
}

impl Verdict {
    pub fn exit_code(&self) -> u8 {
        match self {
            Verdict::Valid => EXIT_OK,
            Verdict::Invalid(_) => EXIT_INVALID,
            Verdict::FileNotFound(_) => EXIT_NOT_FOUND,
        }
    }
}

/// Execute the command, printing the outcome.
///
/// `OK` and `--json` output go to stdout; text reports and missing-file
/// notices go to stderr.
///
/// Returns the exit code for every outcome that is a verdict on the input;
/// anything else is returned as an error for the caller to report.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let config = resolve_config(args);
    tracing::debug!(
        schema_dir = %config.resolve_schema_dir().display(),
        kind = ?args.kind,
        "validating document"
    );

    let verdict = check(args, &config)?;
    match &verdict {
        Verdict::Valid => println!("OK"),
        Verdict::Invalid(failure) if args.json => println!("{}", render_json(failure)?),
        Verdict::Invalid(failure) => eprintln!("{failure}"),
        Verdict::FileNotFound(path) => eprintln!("File not found: {}", path.display()),
    }
    Ok(verdict.exit_code())
}

/// `--spec-dir` wins over `SDT_SPEC_DIR`, which wins over `./spec`.
pub fn resolve_config(args: &ValidateArgs) -> ValidatorConfig {
    match &args.spec_dir {
        Some(dir) => ValidatorConfig::new().with_schema_dir(dir.clone()),
        None => ValidatorConfig::from_env(),
    }
}

/// Validate the document named by `args` without printing anything.
///
/// # Errors
///
/// Any failure that is not a verdict on the input: unreadable or malformed
/// files, missing schemas, schema compilation errors.
pub fn check(args: &ValidateArgs, config: &ValidatorConfig) -> Result<Verdict> {
    if !args.json_path.exists() {
        return Ok(Verdict::FileNotFound(args.json_path.clone()));
    }
    let document = load_document(&args.json_path)?;
    let kind = DocumentKind::from(args.kind);

    let result = match (&args.template, kind) {
        (Some(path), DocumentKind::Agent | DocumentKind::Rule) => {
            if !path.exists() {
                return Ok(Verdict::FileNotFound(path.clone()));
            }
            let template = load_template(path)?;
            if kind == DocumentKind::Agent {
                validate_agent_with_template(&document, &template, config)
            } else {
                validate_rule_with_template(&document, &template, config)
            }
        }
        (Some(_), _) => {
            tracing::warn!(kind = %kind, "--template only applies to agent and rule documents");
            validate_document(kind, &document, config)
        }
        (None, _) => validate_document(kind, &document, config),
    };

    match result {
        Ok(()) => Ok(Verdict::Valid),
        Err(SchemaError::ValidationFailed(failure)) => Ok(Verdict::Invalid(failure)),
        Err(e) => Err(e.into()),
    }
}

/// Violations as a pretty-printed JSON array.
pub fn render_json(failure: &ValidationFailure) -> Result<String> {
    serde_json::to_string_pretty(failure.violations()).context("failed to serialize violations")
}

fn load_template(path: &Path) -> Result<serde_json::Value> {
    load_document(path).with_context(|| format!("failed to load template {}", path.display()))
}

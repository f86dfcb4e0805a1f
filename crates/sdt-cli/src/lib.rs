//! # sdt-cli — SDT Document Validator
//!
//! Backs the `sdt-validate` binary:
//!
//! ```text
//! sdt-validate <KIND> <JSON_PATH> [--spec-dir DIR] [--template FILE] [--json]
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                  |
//! |------|------------------------------------------|
//! | 0    | Document is valid (`OK` on stdout)       |
//! | 1    | Document failed validation               |
//! | 2    | Input file not found                     |
//! | 3    | Any other error (schemas, parsing, I/O)  |
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers here return exit codes.
//! - Validation logic belongs to `sdt-schema`. Nothing here interprets
//!   documents beyond choosing which operation to call.

pub mod validate;

/// The document is valid.
pub const EXIT_OK: u8 = 0;
/// The document failed schema or cross-reference validation.
pub const EXIT_INVALID: u8 = 1;
/// The input document (or `--template` file) does not exist.
pub const EXIT_NOT_FOUND: u8 = 2;
/// Validation could not run.
pub const EXIT_UNEXPECTED: u8 = 3;

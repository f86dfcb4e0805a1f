//! # sdt-validate entry point
//!
//! Parses arguments, initialises logging, and maps the handler result to a
//! process exit code.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sdt_cli::validate::{run_validate, ValidateArgs};
use sdt_cli::EXIT_UNEXPECTED;

/// Validate SDT documents against their JSON Schemas.
#[derive(Parser, Debug)]
#[command(name = "sdt-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long)]
    log_json: bool,

    #[command(flatten)]
    args: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run_validate(&cli.args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Unexpected error: {e:#}");
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}

//! Command line interface for the archive exporter.
//!
//! This module provides argument parsing, logging setup, command execution
//! and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(&args);

    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(&args);
    commands::execute_export(&args, &config).await
}

/// `RUST_LOG` wins; otherwise `--verbose` selects `debug` and `--quiet` `error`.
fn init_logging(args: &Args) {
    let default_filter = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

//! Top-level error types for the exporter binary.
//!
//! This module wraps every failure with an actionable message and recovery
//! suggestions printed by `main`.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for a CLI run
#[derive(Error, Debug)]
pub enum ExportError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("{0}")]
    Export(#[from] crate::export::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl ExportError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::export::Error;

        match self {
            Self::Cli(_) => vec!["Run with --help to list the accepted arguments".to_string()],
            Self::Export(Error::Configuration(_)) => vec![
                "Check the syntax of the --settings file, if one was given".to_string(),
                "Check the archive path, distribution method and product inputs".to_string(),
                "Custom export options must be an XML property list dictionary with a 'method' key"
                    .to_string(),
                "App Clip exports require Xcode 12 or newer".to_string(),
            ],
            Self::Export(Error::ArchiveMalformed(_)) => vec![
                "Make sure the archive was produced by `xcodebuild archive` and is complete"
                    .to_string(),
                "Use --product app when the archive contains no App Clip".to_string(),
            ],
            Self::Export(Error::StoreUnavailable(_)) => vec![
                "Make sure the keychain holding the signing certificates is unlocked".to_string(),
                "Check that `security` and `openssl` are available in PATH".to_string(),
            ],
            Self::Export(Error::ExportFailed(_)) => vec![
                "Inspect the xcodebuild output above".to_string(),
                "If a distribution logs zip was written to the deploy directory, check it for details"
                    .to_string(),
                "Install a provisioning profile matching the distribution method, or pass --team-id"
                    .to_string(),
            ],
            Self::Export(Error::Serialization(_)) => {
                vec!["Re-run with --verbose and report the failing input".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cli(_) => 2,
            _ => 1,
        }
    }
}

//! Error types for archive export operations.
//!
//! Fatal conditions only. Recoverable resolution outcomes (ambiguous or empty
//! signing groups) are reported through [`crate::export::codesign::ResolutionReport`]
//! instead of being raised here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while inspecting, resolving or exporting an archive.
#[derive(Error, Debug)]
pub enum Error {
    /// Operator input or a custom export options document is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The archive does not contain what was requested of it.
    #[error("Archive malformed: {0}")]
    ArchiveMalformed(String),

    /// Certificate or profile enumeration failed.
    #[error("Signing store unavailable: {0}")]
    StoreUnavailable(String),

    /// The export options document could not be produced.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The packaging tool rejected the archive.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Plain IO failure without path context.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// IO failure on a known path.
    #[error("{context} ({path}): {error}")]
    Fs {
        /// What was being done.
        context: String,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Property list parsing or writing failed.
    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    /// Download failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Zip archive creation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Attaches path context to IO results.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`Error::Fs`] with the given context and path.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Turns a missing value into a [`Error::GenericError`].
pub trait Context<T> {
    /// Returns the value or an error carrying `msg`.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::export::Error::GenericError(format!($($arg)*)))
    };
}

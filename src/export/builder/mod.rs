//! Export orchestration and artifact collection.
//!
//! The [`Exporter`]:
//! 1. Determines the `xcodebuild` major version
//! 2. Writes the custom or synthesized export options
//! 3. Runs `xcodebuild -exportArchive`
//! 4. Copies the ipa(s) and zips the dSYMs into the deploy directory
//! 5. Returns [`ExportedArtifact`] records with sizes and checksums
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - the [`Exporter`] and its export steps
//! - [`tool_detection`] - `xcodebuild` lookup and version parsing

pub mod checksum;
pub mod orchestrator;
pub mod tool_detection;

pub use orchestrator::{ExportOutcome, Exporter, LegacyExport, find_distribution_logs_path};
pub use tool_detection::{XcodebuildVersion, parse_xcodebuild_version};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What an exported file is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Ipa,
    DsymZip,
    ExportOptions,
    ResolutionReport,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ipa => "ipa",
            Self::DsymZip => "dSYM zip",
            Self::ExportOptions => "export options",
            Self::ResolutionReport => "resolution report",
        };
        f.write_str(name)
    }
}

/// A file written to the deploy directory.
#[derive(Clone, Debug, Serialize)]
pub struct ExportedArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub size: u64,
    /// Hex SHA-256 of the file.
    pub checksum: String,
}

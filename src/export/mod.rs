//! Xcode archive export.
//!
//! This module resolves a code signing identity for an `.xcarchive`,
//! synthesizes the export options property list and drives
//! `xcodebuild -exportArchive`.
//!
//! # Overview
//!
//! 1. [`archive`] reads the bundle targets and their entitlements
//! 2. [`codesign`] enumerates certificates and profiles and resolves one
//!    signing group
//! 3. [`options`] turns the group into an [`options::ExportOptions`] document
//! 4. [`builder`] writes the document, runs `xcodebuild` and collects artifacts
//!
//! # Example
//!
//! ```no_run
//! use xcarchive_export::export::{DistributionMethod, Exporter, SettingsBuilder};
//!
//! # async fn example() -> xcarchive_export::export::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .archive_path("build/MyApp.xcarchive")
//!     .distribution_method(DistributionMethod::Development)
//!     .team_id("ABCDE12345")
//!     .deploy_dir("build/deploy")
//!     .build()?;
//!
//! let outcome = Exporter::new(settings).export().await?;
//! for artifact in &outcome.artifacts {
//!     println!("{}: {}", artifact.kind, artifact.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod builder;
pub mod codesign;
pub mod error;
pub mod options;
pub mod plan;
pub mod settings;
pub mod utils;

pub use builder::{ArtifactKind, ExportOutcome, ExportedArtifact, Exporter, LegacyExport};
pub use error::{Context, Error, ErrorExt, Result};
pub use plan::{ExportPlan, PlanInputs, plan_export};
pub use settings::{
    DistributionMethod, ExportProduct, ExportSettings, MethodSelection, SettingsBuilder, SettingsFile,
};

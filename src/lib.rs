//! Xcode archive export library
//!
//! This library exports `.xcarchive` bundles into installable packages:
//! - resolves a signing certificate and one provisioning profile per bundle target
//! - synthesizes the `xcodebuild -exportArchive` export options
//! - runs the export and collects the ipa and dSYM artifacts
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod export;

// Re-export commonly used types
pub use error::{CliError, ExportError, Result};

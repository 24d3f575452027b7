//! TOML settings file.

use super::{ExportProduct, MethodSelection};
use crate::export::{Error, ErrorExt, Result};
use std::path::{Path, PathBuf};

/// Export defaults read from a TOML file.
///
/// Every key is optional; command line values override whatever is set here.
///
/// # Configuration
///
/// ```toml
/// archive_path = "build/MyApp.xcarchive"
/// deploy_dir = "build/deploy"
/// distribution_method = "ad-hoc"
/// product = "app"
/// team_id = "ABCDE12345"
/// compile_bitcode = false
/// default_profile_url = "https://example.com/default.mobileprovision"
/// ```
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub archive_path: Option<PathBuf>,

    #[serde(default)]
    pub deploy_dir: Option<PathBuf>,

    /// A distribution method or `auto-detect`.
    #[serde(default)]
    pub distribution_method: Option<MethodSelection>,

    #[serde(default)]
    pub product: Option<ExportProduct>,

    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub upload_bitcode: Option<bool>,

    #[serde(default)]
    pub compile_bitcode: Option<bool>,

    #[serde(default)]
    pub manage_version_and_build_number: Option<bool>,

    /// Complete export options property list, used verbatim.
    #[serde(default)]
    pub export_options_plist_content: Option<String>,

    #[serde(default)]
    pub default_profile_url: Option<String>,

    /// Skips `xcodebuild -version` detection.
    #[serde(default)]
    pub xcodebuild_major_version: Option<u32>,

    #[serde(default)]
    pub use_legacy_export: Option<bool>,

    #[serde(default)]
    pub legacy_export_provisioning_profile_name: Option<String>,
}

impl SettingsFile {
    /// Parses settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("invalid settings file: {}", e)))
    }

    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).fs_context("reading settings file", path)?;
        Self::from_toml(&content)
    }
}

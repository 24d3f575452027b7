//! Builder for constructing ExportSettings.

use super::{ExportProduct, ExportSettings, MethodSelection, SettingsFile};
use crate::export::{Error, Result};
use std::path::{Path, PathBuf};

/// Builder for constructing [`ExportSettings`].
///
/// Values can be layered: start from a [`SettingsFile`] with
/// [`SettingsBuilder::with_file`], then override individual fields. The last
/// write to a field wins.
///
/// # Examples
///
/// ```no_run
/// use xcarchive_export::export::{DistributionMethod, ExportProduct, SettingsBuilder};
///
/// # fn example() -> xcarchive_export::export::Result<()> {
/// let settings = SettingsBuilder::new()
///     .archive_path("build/MyApp.xcarchive")
///     .distribution_method(DistributionMethod::AppStore)
///     .product(ExportProduct::App)
///     .team_id("  ABCDE12345 ")
///     .build()?;
/// assert_eq!(settings.team_id(), Some("ABCDE12345"));
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug, Clone)]
pub struct SettingsBuilder {
    archive_path: Option<PathBuf>,
    deploy_dir: Option<PathBuf>,
    distribution_method: Option<MethodSelection>,
    product: Option<ExportProduct>,
    team_id: Option<String>,
    upload_bitcode: Option<bool>,
    compile_bitcode: Option<bool>,
    manage_version_and_build_number: Option<bool>,
    custom_export_options: Option<String>,
    default_profile_url: Option<String>,
    xcodebuild_major_version: Option<u32>,
    legacy_export: Option<bool>,
    legacy_profile_name: Option<String>,
    dry_run: bool,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a builder pre-populated from a settings file.
    pub fn with_file(file: SettingsFile) -> Self {
        Self {
            archive_path: file.archive_path,
            deploy_dir: file.deploy_dir,
            distribution_method: file.distribution_method,
            product: file.product,
            team_id: file.team_id,
            upload_bitcode: file.upload_bitcode,
            compile_bitcode: file.compile_bitcode,
            manage_version_and_build_number: file.manage_version_and_build_number,
            custom_export_options: file.export_options_plist_content,
            default_profile_url: file.default_profile_url,
            xcodebuild_major_version: file.xcodebuild_major_version,
            legacy_export: file.use_legacy_export,
            legacy_profile_name: file.legacy_export_provisioning_profile_name,
            dry_run: false,
        }
    }

    /// Sets the archive to export.
    ///
    /// # Required
    ///
    /// The path must exist when [`build`](Self::build) is called.
    pub fn archive_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    ///
    /// Default: current directory
    pub fn deploy_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.deploy_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the distribution method, or [`MethodSelection::AutoDetect`] to
    /// take it from the archive's embedded profile.
    ///
    /// # Required
    pub fn distribution_method(mut self, method: impl Into<MethodSelection>) -> Self {
        self.distribution_method = Some(method.into());
        self
    }

    /// Sets the product variant.
    ///
    /// Default: [`ExportProduct::App`]
    pub fn product(mut self, product: ExportProduct) -> Self {
        self.product = Some(product);
        self
    }

    /// Pins the signing team. Whitespace-only values leave the team unset.
    pub fn team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Default: true
    pub fn upload_bitcode(mut self, enabled: bool) -> Self {
        self.upload_bitcode = Some(enabled);
        self
    }

    /// Default: true
    pub fn compile_bitcode(mut self, enabled: bool) -> Self {
        self.compile_bitcode = Some(enabled);
        self
    }

    /// Default: false
    pub fn manage_version_and_build_number(mut self, enabled: bool) -> Self {
        self.manage_version_and_build_number = Some(enabled);
        self
    }

    /// Uses an operator-supplied export options document instead of generating one.
    /// Whitespace-only content is ignored.
    pub fn custom_export_options(mut self, content: impl Into<String>) -> Self {
        self.custom_export_options = Some(content.into());
        self
    }

    /// Sets the URL of the fallback provisioning profile.
    pub fn default_profile_url(mut self, url: impl Into<String>) -> Self {
        self.default_profile_url = Some(url.into());
        self
    }

    /// Overrides build tool version detection.
    pub fn xcodebuild_major_version(mut self, major: u32) -> Self {
        self.xcodebuild_major_version = Some(major);
        self
    }

    /// Default: false
    pub fn legacy_export(mut self, enabled: bool) -> Self {
        self.legacy_export = Some(enabled);
        self
    }

    /// Names the profile for a legacy export. Whitespace-only values fall
    /// back to the archive's embedded profile.
    pub fn legacy_profile_name(mut self, name: impl Into<String>) -> Self {
        self.legacy_profile_name = Some(name.into());
        self
    }

    /// Default: false
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if:
    /// - `archive_path` is missing or does not exist
    /// - `distribution_method` is missing
    /// - a build tool version override is too old for the requested product
    pub fn build(self) -> Result<ExportSettings> {
        let archive_path = self
            .archive_path
            .ok_or_else(|| Error::Configuration("archive path is required".to_string()))?;
        if !archive_path.exists() {
            return Err(Error::Configuration(format!(
                "archive does not exist at {}",
                archive_path.display()
            )));
        }

        let distribution_method = self.distribution_method.ok_or_else(|| {
            Error::Configuration("distribution method is required".to_string())
        })?;

        let settings = ExportSettings::new(
            archive_path,
            self.deploy_dir.unwrap_or_else(|| PathBuf::from(".")),
            distribution_method,
            self.product.unwrap_or_default(),
            non_blank(self.team_id),
            self.upload_bitcode.unwrap_or(true),
            self.compile_bitcode.unwrap_or(true),
            self.manage_version_and_build_number.unwrap_or(false),
            non_blank(self.custom_export_options),
            non_blank(self.default_profile_url),
            self.xcodebuild_major_version,
            self.legacy_export.unwrap_or(false),
            non_blank(self.legacy_profile_name),
            self.dry_run,
        );

        if let Some(major) = settings.xcodebuild_major_version() {
            settings.ensure_product_supported(major)?;
        }

        Ok(settings)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Core ExportSettings struct and implementations.

use super::{ExportProduct, MethodSelection};
use crate::export::{Error, Result};
use std::path::{Path, PathBuf};

/// Validated settings for one export run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder); every field is
/// already trimmed and checked, so downstream code never re-validates.
///
/// # Examples
///
/// ```no_run
/// use xcarchive_export::export::{DistributionMethod, MethodSelection, SettingsBuilder};
///
/// # fn example() -> xcarchive_export::export::Result<()> {
/// let settings = SettingsBuilder::new()
///     .archive_path("build/MyApp.xcarchive")
///     .distribution_method(DistributionMethod::AdHoc)
///     .deploy_dir("build/deploy")
///     .build()?;
/// assert_eq!(
///     settings.distribution_method(),
///     MethodSelection::Fixed(DistributionMethod::AdHoc)
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ExportSettings {
    archive_path: PathBuf,
    deploy_dir: PathBuf,
    distribution_method: MethodSelection,
    product: ExportProduct,
    team_id: Option<String>,
    upload_bitcode: bool,
    compile_bitcode: bool,
    manage_version_and_build_number: bool,
    custom_export_options: Option<String>,
    default_profile_url: Option<String>,
    xcodebuild_major_version: Option<u32>,
    legacy_export: bool,
    legacy_profile_name: Option<String>,
    dry_run: bool,
}

impl ExportSettings {
    /// Path of the `.xcarchive` to export.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Directory receiving the export options, artifacts and reports.
    pub fn deploy_dir(&self) -> &Path {
        &self.deploy_dir
    }

    /// Requested distribution method, possibly to be detected from the archive.
    pub fn distribution_method(&self) -> MethodSelection {
        self.distribution_method
    }

    /// Requested product variant.
    pub fn product(&self) -> ExportProduct {
        self.product
    }

    /// Explicit team identifier, if the operator pinned one.
    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    /// Whether bitcode is uploaded with App Store exports.
    pub fn upload_bitcode(&self) -> bool {
        self.upload_bitcode
    }

    /// Whether bitcode is recompiled for non App Store exports.
    pub fn compile_bitcode(&self) -> bool {
        self.compile_bitcode
    }

    /// Whether App Store Connect manages the version and build number.
    pub fn manage_version_and_build_number(&self) -> bool {
        self.manage_version_and_build_number
    }

    /// Operator-supplied export options document, used verbatim when set.
    pub fn custom_export_options(&self) -> Option<&str> {
        self.custom_export_options.as_deref()
    }

    /// Where the default (fallback) provisioning profile can be downloaded.
    pub fn default_profile_url(&self) -> Option<&str> {
        self.default_profile_url.as_deref()
    }

    /// Build tool major version override; detected when `None`.
    pub fn xcodebuild_major_version(&self) -> Option<u32> {
        self.xcodebuild_major_version
    }

    /// Export with `-exportFormat ipa` and a named profile instead of an
    /// export options document.
    pub fn legacy_export(&self) -> bool {
        self.legacy_export
    }

    /// Profile named to the legacy export; the archive's embedded profile
    /// when `None`.
    pub fn legacy_profile_name(&self) -> Option<&str> {
        self.legacy_profile_name.as_deref()
    }

    /// Stop after writing the export options.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Fails when the requested product needs a newer build tool than `major`.
    pub fn ensure_product_supported(&self, major: u32) -> Result<()> {
        let required = self.product.min_xcodebuild_major();
        if major < required {
            return Err(Error::Configuration(format!(
                "exporting '{}' requires Xcode {} or newer, found Xcode {}",
                self.product, required, major
            )));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        archive_path: PathBuf,
        deploy_dir: PathBuf,
        distribution_method: MethodSelection,
        product: ExportProduct,
        team_id: Option<String>,
        upload_bitcode: bool,
        compile_bitcode: bool,
        manage_version_and_build_number: bool,
        custom_export_options: Option<String>,
        default_profile_url: Option<String>,
        xcodebuild_major_version: Option<u32>,
        legacy_export: bool,
        legacy_profile_name: Option<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            archive_path,
            deploy_dir,
            distribution_method,
            product,
            team_id,
            upload_bitcode,
            compile_bitcode,
            manage_version_and_build_number,
            custom_export_options,
            default_profile_url,
            xcodebuild_major_version,
            legacy_export,
            legacy_profile_name,
            dry_run,
        }
    }
}

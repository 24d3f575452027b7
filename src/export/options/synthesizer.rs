//! Export options synthesis.
//!
//! Optional keys are gated on the build tool's major version; a key below its
//! threshold is left out of the document rather than written with a default.

use super::ExportOptions;
use crate::export::codesign::{ResolvedGroup, SigningStyle};
use crate::export::{DistributionMethod, ExportSettings};

/// First Xcode accepting `provisioningProfiles`, `signingCertificate`,
/// `teamID` and `signingStyle`.
pub const SIGNING_FIELDS_MIN_XCODE: u32 = 9;

/// First Xcode accepting `distributionBundleIdentifier`.
pub const DISTRIBUTION_BUNDLE_ID_MIN_XCODE: u32 = 12;

/// First Xcode accepting `manageAppVersionAndBuildNumber`.
pub const MANAGE_VERSION_MIN_XCODE: u32 = 13;

/// Builds [`ExportOptions`] from a resolution outcome and operator input.
///
/// # Examples
///
/// ```
/// use xcarchive_export::export::DistributionMethod;
/// use xcarchive_export::export::options::ExportConfigSynthesizer;
///
/// let options = ExportConfigSynthesizer::new(DistributionMethod::AdHoc, 14)
///     .primary_bundle_id("com.acme.app")
///     .synthesize(None);
///
/// assert_eq!(options.distribution_bundle_identifier.as_deref(), Some("com.acme.app"));
/// assert!(!options.has_signing_fields());
/// ```
#[derive(Clone, Debug)]
pub struct ExportConfigSynthesizer {
    method: DistributionMethod,
    xcodebuild_major: u32,
    upload_bitcode: bool,
    compile_bitcode: bool,
    manage_version_and_build_number: bool,
    archive_managed: bool,
    primary_bundle_id: Option<String>,
}

impl ExportConfigSynthesizer {
    pub fn new(method: DistributionMethod, xcodebuild_major: u32) -> Self {
        Self {
            method,
            xcodebuild_major,
            upload_bitcode: true,
            compile_bitcode: true,
            manage_version_and_build_number: false,
            archive_managed: false,
            primary_bundle_id: None,
        }
    }

    /// Takes the bitcode flags from validated settings; `method` is the
    /// requested method with auto-detection already applied.
    pub fn from_settings(
        settings: &ExportSettings,
        method: DistributionMethod,
        xcodebuild_major: u32,
    ) -> Self {
        Self::new(method, xcodebuild_major)
            .upload_bitcode(settings.upload_bitcode())
            .compile_bitcode(settings.compile_bitcode())
            .manage_version_and_build_number(settings.manage_version_and_build_number())
    }

    pub fn upload_bitcode(mut self, enabled: bool) -> Self {
        self.upload_bitcode = enabled;
        self
    }

    pub fn compile_bitcode(mut self, enabled: bool) -> Self {
        self.compile_bitcode = enabled;
        self
    }

    pub fn manage_version_and_build_number(mut self, enabled: bool) -> Self {
        self.manage_version_and_build_number = enabled;
        self
    }

    /// Whether the archive was signed with an Xcode managed profile.
    pub fn archive_managed(mut self, managed: bool) -> Self {
        self.archive_managed = managed;
        self
    }

    pub fn primary_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.primary_bundle_id = Some(bundle_id.into());
        self
    }

    /// Produces the document. Without a group every signing field stays unset.
    pub fn synthesize(&self, group: Option<&ResolvedGroup>) -> ExportOptions {
        let mut options = ExportOptions::new(self.method);

        if self.method == DistributionMethod::AppStore {
            options.upload_bitcode = Some(self.upload_bitcode);
            if self.xcodebuild_major >= MANAGE_VERSION_MIN_XCODE {
                options.manage_app_version_and_build_number =
                    Some(self.manage_version_and_build_number);
            }
        } else {
            options.compile_bitcode = Some(self.compile_bitcode);
            if self.xcodebuild_major >= DISTRIBUTION_BUNDLE_ID_MIN_XCODE {
                options.distribution_bundle_identifier = self.primary_bundle_id.clone();
            }
        }

        if self.xcodebuild_major >= SIGNING_FIELDS_MIN_XCODE {
            if let Some(group) = group {
                self.apply_signing(&mut options, group);
            }
        }

        options
    }

    fn apply_signing(&self, options: &mut ExportOptions, group: &ResolvedGroup) {
        let profiles = group.profile_names();
        options.provisioning_profiles = (!profiles.is_empty()).then_some(profiles);
        options.signing_certificate = Some(group.certificate.common_name.clone());
        options.team_id = Some(group.certificate.team_id.clone());

        if self.archive_managed && group.signing_style() == SigningStyle::Manual {
            log::warn!("App was signed with an Xcode managed profile when archiving,");
            log::warn!("ipa export uses manual code signing.");
            log::warn!("Setting \"signingStyle\" to \"manual\"");
            options.signing_style = Some(SigningStyle::Manual);
        }
    }
}

//! Export planning: capability inspection, signing resolution and export
//! options synthesis, without touching the output directory.

use crate::export::archive::{ArchiveCapabilities, ArchiveReader, CapabilityInspector};
use crate::export::codesign::{
    CertificateStore, CodeSignGroupResolver, ProfileStore, ProvisioningProfile, Resolution,
    ResolutionRequest,
};
use crate::export::options::{ExportConfigSynthesizer, ExportOptions, SIGNING_FIELDS_MIN_XCODE};
use crate::export::{DistributionMethod, ExportSettings, MethodSelection, Result};

/// Everything decided before `xcodebuild` runs.
#[derive(Clone, Debug)]
pub struct ExportPlan {
    /// The requested method, or the one detected from the archive.
    pub method: DistributionMethod,
    pub options: ExportOptions,
    pub capabilities: ArchiveCapabilities,
    /// `None` when the build tool predates per-target signing options.
    pub resolution: Option<Resolution>,
}

/// Signing material and archive access used by [`plan_export`].
pub struct PlanInputs<'a> {
    pub certificates: &'a dyn CertificateStore,
    pub profiles: &'a dyn ProfileStore,
    pub archive: &'a dyn ArchiveReader,
    pub default_profile: Option<&'a ProvisioningProfile>,
    pub xcodebuild_major: u32,
}

/// Inspects the archive, resolves a signing group and synthesizes options.
///
/// The archive is inspected before any store is queried, so a missing
/// product variant fails without touching the keychain.
///
/// # Errors
///
/// - configuration and archive errors from [`CapabilityInspector::inspect`]
/// - [`crate::export::Error::StoreUnavailable`] when enumeration fails
pub fn plan_export(settings: &ExportSettings, inputs: PlanInputs<'_>) -> Result<ExportPlan> {
    let capabilities = CapabilityInspector::new(inputs.archive)
        .inspect(settings.product(), Some(inputs.xcodebuild_major))?;

    let method = settings
        .distribution_method()
        .resolve(capabilities.original_profile.export_method);
    if settings.distribution_method() == MethodSelection::AutoDetect {
        log::info!(
            "Detected export method {} from '{}'",
            method,
            capabilities.original_profile.name
        );
    }

    let synthesizer = ExportConfigSynthesizer::from_settings(settings, method, inputs.xcodebuild_major)
        .archive_managed(capabilities.original_profile.managed)
        .primary_bundle_id(capabilities.primary_bundle_id());

    if inputs.xcodebuild_major < SIGNING_FIELDS_MIN_XCODE {
        log::warn!(
            "Xcode {} does not support per-target signing options, skipping code signing resolution",
            inputs.xcodebuild_major
        );
        return Ok(ExportPlan {
            method,
            options: synthesizer.synthesize(None),
            capabilities,
            resolution: None,
        });
    }

    let certificates = inputs.certificates.list_valid()?;
    log::debug!("{} valid signing certificate(s) installed", certificates.len());
    for certificate in &certificates {
        log::debug!(
            "  {} [{}] serial {}",
            certificate.common_name,
            certificate.team_id,
            certificate.serial
        );
    }

    let profiles = inputs.profiles.list_installed(capabilities.kind)?;
    log::debug!("{} provisioning profile(s) installed", profiles.len());
    for profile in &profiles {
        log::debug!(
            "  {} ({}) {} [{}]",
            profile.name,
            profile.uuid,
            profile.bundle_id_pattern,
            profile.export_method
        );
    }

    let request = ResolutionRequest {
        method,
        team_id: settings.team_id().map(String::from),
        archive_managed: capabilities.original_profile.managed,
        default_profile_name: inputs.default_profile.map(|p| p.name.clone()),
    };

    let resolution =
        CodeSignGroupResolver::new(&certificates, &profiles, &capabilities.targets).resolve(&request);

    if let Some(group) = &resolution.group {
        log::info!(
            "Signing with {} [{}]",
            group.certificate.common_name,
            group.certificate.team_id
        );
        for (bundle_id, profile) in &group.profiles {
            log::info!("  {bundle_id}: {} ({})", profile.name, profile.uuid);
        }
    }

    Ok(ExportPlan {
        method,
        options: synthesizer.synthesize(resolution.group.as_ref()),
        capabilities,
        resolution: Some(resolution),
    })
}

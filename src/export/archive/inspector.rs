//! Capability extraction for the requested product.

use super::{ArchiveReader, BundleTarget, OriginalSigningProfile};
use crate::export::codesign::ProfileKind;
use crate::export::{Error, ExportProduct, Result};

/// What resolution needs to know about an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveCapabilities {
    /// Primary target first, no duplicate bundle identifiers.
    pub targets: Vec<BundleTarget>,
    pub original_profile: OriginalSigningProfile,
    pub kind: ProfileKind,
}

impl ArchiveCapabilities {
    /// Bundle identifier of the distributed product.
    pub fn primary_bundle_id(&self) -> &str {
        // `inspect` never returns an empty target list
        self.targets
            .first()
            .map(|t| t.bundle_id.as_str())
            .unwrap_or_default()
    }
}

/// Extracts bundle targets and their entitlements from an archive.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use xcarchive_export::export::ExportProduct;
/// use xcarchive_export::export::archive::{CapabilityInspector, XcArchive};
///
/// # fn example() -> xcarchive_export::export::Result<()> {
/// let archive = XcArchive::open(Path::new("build/MyApp.xcarchive"))?;
/// let capabilities = CapabilityInspector::new(&archive).inspect(ExportProduct::App, Some(15))?;
/// println!("exporting {}", capabilities.primary_bundle_id());
/// # Ok(())
/// # }
/// ```
pub struct CapabilityInspector<'a, R: ArchiveReader + ?Sized> {
    reader: &'a R,
}

impl<'a, R: ArchiveReader + ?Sized> CapabilityInspector<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Collects the targets of `product`.
    ///
    /// `xcodebuild_major` is checked against the product's minimum build tool
    /// version when known.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] when the build tool is too old for `product`
    /// - [`Error::ArchiveMalformed`] when `product` is not in the archive
    pub fn inspect(
        &self,
        product: ExportProduct,
        xcodebuild_major: Option<u32>,
    ) -> Result<ArchiveCapabilities> {
        if let Some(major) = xcodebuild_major {
            let required = product.min_xcodebuild_major();
            if major < required {
                return Err(Error::Configuration(format!(
                    "exporting '{product}' requires Xcode {required} or newer, found Xcode {major}"
                )));
            }
        }

        let mut targets: Vec<BundleTarget> = Vec::new();
        for target in self.reader.bundle_targets(product)? {
            if targets.iter().any(|t| t.bundle_id == target.bundle_id) {
                log::debug!("Duplicate bundle target {} ignored", target.bundle_id);
                continue;
            }
            targets.push(target);
        }
        if targets.is_empty() {
            return Err(Error::ArchiveMalformed(format!(
                "archive contains no '{product}' bundle"
            )));
        }

        for target in &targets {
            let keys: Vec<&str> = target.entitlement_keys.iter().map(String::as_str).collect();
            log::debug!("{} entitlements: [{}]", target.bundle_id, keys.join(", "));
        }

        let original_profile = self.reader.original_signing_profile(product)?;
        log::info!(
            "Archive was signed with '{}' ({}, {})",
            original_profile.name,
            original_profile.export_method,
            if original_profile.managed {
                "Xcode managed"
            } else {
                "manually managed"
            }
        );

        Ok(ArchiveCapabilities {
            targets,
            original_profile,
            kind: self.reader.profile_kind(),
        })
    }
}

//! Archive metadata.
//!
//! An [`ArchiveReader`] exposes what resolution needs from an archive: the
//! bundle targets with their declared entitlements, and the profile the
//! archive was originally signed with. [`CapabilityInspector`] validates the
//! requested product against it.

mod inspector;
mod xcarchive;

pub use inspector::{ArchiveCapabilities, CapabilityInspector};
pub use xcarchive::XcArchive;

use crate::export::codesign::ProfileKind;
use crate::export::{DistributionMethod, ExportProduct, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// A distributable bundle inside the archive and the entitlements it declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BundleTarget {
    pub bundle_id: String,
    pub entitlement_keys: BTreeSet<String>,
}

impl BundleTarget {
    pub fn new<I, S>(bundle_id: impl Into<String>, entitlement_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bundle_id: bundle_id.into(),
            entitlement_keys: entitlement_keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// The profile the distributed product was signed with when archiving.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OriginalSigningProfile {
    pub name: String,
    pub managed: bool,
    pub export_method: DistributionMethod,
}

/// Read access to an archive's signing-relevant metadata.
pub trait ArchiveReader {
    /// Targets for `product`, primary target first.
    ///
    /// # Errors
    ///
    /// [`crate::export::Error::ArchiveMalformed`] when the product is not in the archive.
    fn bundle_targets(&self, product: ExportProduct) -> Result<Vec<BundleTarget>>;

    /// The profile `product` was signed with when archiving. An App Clip
    /// without its own embedded profile falls back to the main application's.
    fn original_signing_profile(&self, product: ExportProduct) -> Result<OriginalSigningProfile>;

    /// Platform the archive was built for.
    fn profile_kind(&self) -> ProfileKind {
        ProfileKind::Ios
    }
}

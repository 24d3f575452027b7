//! Signing groups: a certificate plus the profiles it can sign each target with.

use super::certificate::Certificate;
use super::profile::ProvisioningProfile;
use crate::export::archive::BundleTarget;
use serde::Serialize;
use std::collections::BTreeMap;

/// How the export tool should sign: with explicitly named profiles, or by
/// letting Xcode manage them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub enum SigningStyle {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "automatic")]
    Automatic,
}

/// A candidate certificate with every compatible profile per bundle identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectableGroup {
    pub certificate: Certificate,
    pub profiles: BTreeMap<String, Vec<ProvisioningProfile>>,
}

impl SelectableGroup {
    /// Replaces each target's profile list with the profiles accepted by `keep`.
    ///
    /// Returns `None` when a target that had candidates is left without any.
    /// Targets that were already uncovered stay uncovered.
    pub fn narrow<F>(&self, mut keep: F) -> Option<SelectableGroup>
    where
        F: FnMut(&str, &ProvisioningProfile) -> bool,
    {
        let mut profiles = BTreeMap::new();
        for (bundle_id, candidates) in &self.profiles {
            let kept: Vec<ProvisioningProfile> = candidates
                .iter()
                .filter(|profile| keep(bundle_id, profile))
                .cloned()
                .collect();
            if kept.is_empty() && !candidates.is_empty() {
                return None;
            }
            profiles.insert(bundle_id.clone(), kept);
        }

        Some(SelectableGroup {
            certificate: self.certificate.clone(),
            profiles,
        })
    }

    /// Number of targets with at least one candidate profile.
    pub fn covered_targets(&self) -> usize {
        self.profiles.values().filter(|c| !c.is_empty()).count()
    }

    /// Whether every profile candidate list is non-empty.
    pub fn covers_all_targets(&self) -> bool {
        self.covered_targets() == self.profiles.len()
    }
}

/// The selected certificate and exactly one profile per bundle identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedGroup {
    pub certificate: Certificate,
    pub profiles: BTreeMap<String, ProvisioningProfile>,
}

impl ResolvedGroup {
    /// `Automatic` only when every profile is Xcode managed.
    pub fn signing_style(&self) -> SigningStyle {
        if !self.profiles.is_empty() && self.profiles.values().all(|p| p.managed) {
            SigningStyle::Automatic
        } else {
            SigningStyle::Manual
        }
    }

    /// Whether managed and non-managed profiles are mixed.
    pub fn has_mixed_management(&self) -> bool {
        let managed = self.profiles.values().filter(|p| p.managed).count();
        managed > 0 && managed < self.profiles.len()
    }

    /// Bundle identifier → profile name, as written to the export options.
    pub fn profile_names(&self) -> BTreeMap<String, String> {
        self.profiles
            .iter()
            .map(|(bundle_id, profile)| (bundle_id.clone(), profile.name.clone()))
            .collect()
    }
}

/// Pins enumeration order: certificates by serial then fingerprint, profiles by UUID.
pub(super) fn pin_order(
    certificates: &[Certificate],
    profiles: &[ProvisioningProfile],
) -> (Vec<Certificate>, Vec<ProvisioningProfile>) {
    let mut certificates = certificates.to_vec();
    certificates.sort_by(|a, b| {
        a.serial
            .cmp(&b.serial)
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });

    let mut profiles = profiles.to_vec();
    profiles.sort_by(|a, b| a.uuid.cmp(&b.uuid));

    (certificates, profiles)
}

/// Builds one group per certificate that can sign at least one target.
///
/// A profile is a candidate for a target when its bundle identifier pattern
/// matches and it embeds the certificate. Every target gets an entry, empty
/// when uncovered. Groups covering more targets rank first; ties keep
/// certificate order.
pub(super) fn seed_groups(
    certificates: &[Certificate],
    profiles: &[ProvisioningProfile],
    targets: &[BundleTarget],
) -> Vec<SelectableGroup> {
    let mut groups = Vec::new();

    for certificate in certificates {
        let by_target: BTreeMap<String, Vec<ProvisioningProfile>> = targets
            .iter()
            .map(|target| {
                let candidates = profiles
                    .iter()
                    .filter(|p| {
                        p.matches_bundle_id(&target.bundle_id)
                            && p.embeds_certificate(&certificate.fingerprint)
                    })
                    .cloned()
                    .collect();
                (target.bundle_id.clone(), candidates)
            })
            .collect();

        let group = SelectableGroup {
            certificate: certificate.clone(),
            profiles: by_target,
        };
        if group.covered_targets() > 0 {
            groups.push(group);
        }
    }

    groups.sort_by(|a, b| b.covered_targets().cmp(&a.covered_targets()));
    groups
}

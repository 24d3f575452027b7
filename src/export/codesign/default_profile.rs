//! Default (fallback) provisioning profile lookup.

use super::profile::ProvisioningProfile;
use crate::export::utils::http::download;

/// Downloads and decodes the default provisioning profile.
///
/// Any failure means "no default profile": resolution then runs without the
/// default profile exclusion step.
pub async fn fetch_default_profile(url: &str) -> Option<ProvisioningProfile> {
    let bytes = match download(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to download default provisioning profile: {}", e);
            return None;
        }
    };

    match ProvisioningProfile::from_mobileprovision(&bytes) {
        Ok(profile) => {
            log::debug!("Default profile: {} ({})", profile.name, profile.uuid);
            Some(profile)
        }
        Err(e) => {
            log::warn!("Failed to read default provisioning profile: {}", e);
            None
        }
    }
}

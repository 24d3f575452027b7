//! Provisioning profiles.
//!
//! A `.mobileprovision` file is a CMS envelope around an XML property list.
//! The envelope is not verified here; the payload between `<?xml` and
//! `</plist>` is extracted and decoded.

use crate::export::{DistributionMethod, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeSet;
use std::time::SystemTime;

/// Platform a profile is issued for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ProfileKind {
    #[default]
    Ios,
    Tvos,
}

impl ProfileKind {
    /// Maps a `DTPlatformName` value (`iphoneos`, `appletvos`, ...).
    pub fn from_platform_name(name: &str) -> Self {
        if name.to_ascii_lowercase().starts_with("appletv") {
            Self::Tvos
        } else {
            Self::Ios
        }
    }
}

/// An installed provisioning profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisioningProfile {
    pub name: String,
    pub uuid: String,
    pub team_id: String,
    pub team_name: String,
    /// Application identifier without the team prefix, e.g. `com.acme.app` or `com.acme.*`.
    pub bundle_id_pattern: String,
    pub export_method: DistributionMethod,
    pub kind: ProfileKind,
    /// Uppercase hex SHA-1 fingerprints of the embedded developer certificates.
    pub certificate_fingerprints: BTreeSet<String>,
    pub entitlement_keys: BTreeSet<String>,
    pub managed: bool,
    pub expiration_date: DateTime<Utc>,
}

impl ProvisioningProfile {
    /// Decodes a `.mobileprovision` file's bytes.
    pub fn from_mobileprovision(bytes: &[u8]) -> Result<Self> {
        let payload = extract_plist_payload(bytes).ok_or_else(|| {
            Error::GenericError("provisioning profile contains no property list".to_string())
        })?;
        let value = plist::Value::from_reader_xml(payload)?;
        Self::from_plist(&value)
    }

    /// Builds a profile from an already decoded property list.
    pub fn from_plist(value: &plist::Value) -> Result<Self> {
        let dict = value.as_dictionary().ok_or_else(|| {
            Error::GenericError("provisioning profile is not a dictionary".to_string())
        })?;

        let string = |key: &str| dict.get(key).and_then(plist::Value::as_string);
        let name = string("Name")
            .ok_or_else(|| Error::GenericError("provisioning profile has no Name".to_string()))?
            .to_string();
        let uuid = string("UUID")
            .ok_or_else(|| Error::GenericError(format!("profile '{}' has no UUID", name)))?
            .to_string();

        let team_id = dict
            .get("TeamIdentifier")
            .and_then(plist::Value::as_array)
            .and_then(|ids| ids.first())
            .and_then(plist::Value::as_string)
            .unwrap_or_default()
            .to_string();
        let team_name = string("TeamName").unwrap_or_default().to_string();

        let entitlements = dict
            .get("Entitlements")
            .and_then(plist::Value::as_dictionary)
            .cloned()
            .unwrap_or_default();
        let application_identifier = entitlements
            .get("application-identifier")
            .and_then(plist::Value::as_string)
            .unwrap_or_default();
        let bundle_id_pattern = strip_team_prefix(application_identifier, &team_id);
        let entitlement_keys = entitlements.keys().cloned().collect();

        let get_task_allow = entitlements
            .get("get-task-allow")
            .and_then(plist::Value::as_boolean)
            .unwrap_or(false);
        let provisions_all_devices = dict
            .get("ProvisionsAllDevices")
            .and_then(plist::Value::as_boolean)
            .unwrap_or(false);
        let has_devices = dict
            .get("ProvisionedDevices")
            .and_then(plist::Value::as_array)
            .is_some_and(|devices| !devices.is_empty());
        let export_method = classify_export_method(provisions_all_devices, has_devices, get_task_allow);

        let kind = dict
            .get("Platform")
            .and_then(plist::Value::as_array)
            .and_then(|platforms| platforms.iter().find_map(plist::Value::as_string))
            .map(|platform| {
                if platform.eq_ignore_ascii_case("tvOS") {
                    ProfileKind::Tvos
                } else {
                    ProfileKind::Ios
                }
            })
            .unwrap_or_default();

        let certificate_fingerprints = dict
            .get("DeveloperCertificates")
            .and_then(plist::Value::as_array)
            .map(|certs| {
                certs
                    .iter()
                    .filter_map(plist::Value::as_data)
                    .map(certificate_fingerprint)
                    .collect()
            })
            .unwrap_or_default();

        let managed = dict
            .get("IsXcodeManaged")
            .and_then(plist::Value::as_boolean)
            .unwrap_or(false)
            || is_xcode_managed_name(&name);

        let expiration_date = dict
            .get("ExpirationDate")
            .and_then(plist::Value::as_date)
            .map(|date| DateTime::<Utc>::from(SystemTime::from(date)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Ok(Self {
            name,
            uuid,
            team_id,
            team_name,
            bundle_id_pattern,
            export_method,
            kind,
            certificate_fingerprints,
            entitlement_keys,
            managed,
            expiration_date,
        })
    }

    /// Whether the profile's bundle identifier pattern covers `bundle_id`.
    pub fn matches_bundle_id(&self, bundle_id: &str) -> bool {
        if self.bundle_id_pattern == bundle_id {
            return true;
        }
        if !self.bundle_id_pattern.contains('*') {
            return false;
        }
        glob::Pattern::new(&self.bundle_id_pattern)
            .map(|pattern| pattern.matches(bundle_id))
            .unwrap_or(false)
    }

    /// Whether the profile embeds the certificate with this fingerprint.
    pub fn embeds_certificate(&self, fingerprint: &str) -> bool {
        self.certificate_fingerprints
            .contains(&fingerprint.to_ascii_uppercase())
    }

    /// Whether every key in `required` is granted by this profile.
    pub fn grants_entitlements(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.entitlement_keys)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date < now
    }
}

/// Managed profiles are recognised by the names Xcode gives them.
pub fn is_xcode_managed_name(name: &str) -> bool {
    if name.starts_with("XC ") || name.starts_with("XC:") {
        return true;
    }
    ["iOS Team", "tvOS Team", "Mac Team"]
        .iter()
        .any(|prefix| name.starts_with(prefix) && name.contains("Provisioning Profile"))
}

/// Derives the distribution method a profile allows.
///
/// All-device profiles are enterprise, device-bound profiles are development
/// when debuggable and ad-hoc otherwise, and device-less profiles are App Store.
pub fn classify_export_method(
    provisions_all_devices: bool,
    has_devices: bool,
    get_task_allow: bool,
) -> DistributionMethod {
    if provisions_all_devices {
        DistributionMethod::Enterprise
    } else if has_devices {
        if get_task_allow {
            DistributionMethod::Development
        } else {
            DistributionMethod::AdHoc
        }
    } else {
        DistributionMethod::AppStore
    }
}

/// Uppercase hex SHA-1 of a DER certificate.
pub fn certificate_fingerprint(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

fn strip_team_prefix(application_identifier: &str, team_id: &str) -> String {
    if !team_id.is_empty() {
        if let Some(rest) = application_identifier
            .strip_prefix(team_id)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            return rest.to_string();
        }
    }
    // Prefix may be an app id prefix that differs from the team identifier.
    application_identifier
        .split_once('.')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_else(|| application_identifier.to_string())
}

fn extract_plist_payload(bytes: &[u8]) -> Option<&[u8]> {
    const START: &[u8] = b"<?xml";
    const END: &[u8] = b"</plist>";

    let start = bytes.windows(START.len()).position(|w| w == START)?;
    let end_offset = bytes[start..]
        .windows(END.len())
        .position(|w| w == END)?;
    Some(&bytes[start..start + end_offset + END.len()])
}

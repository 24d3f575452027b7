//! Export options documents consumed by `xcodebuild -exportArchive`.
//!
//! [`ExportOptions`] is plain data; [`ExportConfigSynthesizer`] fills it from a
//! resolved signing group. Operators may bypass synthesis with their own
//! document, checked by [`validate_custom_export_options`].

mod custom;
mod synthesizer;

pub use custom::validate_custom_export_options;
pub use synthesizer::{
    DISTRIBUTION_BUNDLE_ID_MIN_XCODE, ExportConfigSynthesizer, MANAGE_VERSION_MIN_XCODE,
    SIGNING_FIELDS_MIN_XCODE,
};

use crate::export::codesign::SigningStyle;
use crate::export::{DistributionMethod, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The export options property list.
///
/// Unset fields are omitted from the serialized document entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub method: DistributionMethod,

    #[serde(rename = "teamID", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_bitcode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_bitcode: Option<bool>,

    /// Bundle identifier → provisioning profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_profiles: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_style: Option<SigningStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_app_version_and_build_number: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_bundle_identifier: Option<String>,
}

impl ExportOptions {
    /// Options carrying only the distribution method.
    pub fn new(method: DistributionMethod) -> Self {
        Self {
            method,
            team_id: None,
            upload_bitcode: None,
            compile_bitcode: None,
            provisioning_profiles: None,
            signing_certificate: None,
            signing_style: None,
            manage_app_version_and_build_number: None,
            distribution_bundle_identifier: None,
        }
    }

    /// Whether any code signing field is set.
    pub fn has_signing_fields(&self) -> bool {
        self.team_id.is_some()
            || self.provisioning_profiles.is_some()
            || self.signing_certificate.is_some()
            || self.signing_style.is_some()
    }

    /// Serializes to an XML property list.
    ///
    /// # Errors
    ///
    /// [`Error::Serialization`] when the document cannot be encoded.
    pub fn to_plist_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        plist::to_writer_xml(&mut buffer, self)
            .map_err(|e| Error::Serialization(format!("export options: {e}")))?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Serialization(format!("export options are not UTF-8: {e}")))
    }

    /// Parses an XML property list written by [`ExportOptions::to_plist_string`].
    pub fn from_plist_str(content: &str) -> Result<Self> {
        plist::from_bytes(content.as_bytes())
            .map_err(|e| Error::Serialization(format!("export options: {e}")))
    }
}

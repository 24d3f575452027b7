//! Shared fixtures: signing material and on-disk archives.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use plist::{Dictionary, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use xcarchive_export::export::DistributionMethod;
use xcarchive_export::export::archive::BundleTarget;
use xcarchive_export::export::codesign::{Certificate, ProfileKind, ProvisioningProfile};

pub fn certificate(common_name: &str, team_id: &str, serial: &str) -> Certificate {
    Certificate {
        common_name: common_name.to_string(),
        team_id: team_id.to_string(),
        team_name: format!("{team_id} Inc."),
        serial: serial.to_string(),
        fingerprint: format!("FINGERPRINT{serial}"),
        not_before: Utc::now() - Duration::days(30),
        not_after: Utc::now() + Duration::days(300),
    }
}

/// A non-managed iOS profile embedding `certificate`, granting `application-identifier`.
pub fn profile(
    name: &str,
    uuid: &str,
    bundle_id_pattern: &str,
    method: DistributionMethod,
    certificate: &Certificate,
) -> ProvisioningProfile {
    ProvisioningProfile {
        name: name.to_string(),
        uuid: uuid.to_string(),
        team_id: certificate.team_id.clone(),
        team_name: certificate.team_name.clone(),
        bundle_id_pattern: bundle_id_pattern.to_string(),
        export_method: method,
        kind: ProfileKind::Ios,
        certificate_fingerprints: BTreeSet::from([certificate.fingerprint.clone()]),
        entitlement_keys: BTreeSet::from(["application-identifier".to_string()]),
        managed: false,
        expiration_date: Utc::now() + Duration::days(200),
    }
}

pub fn with_entitlements(mut profile: ProvisioningProfile, keys: &[&str]) -> ProvisioningProfile {
    profile
        .entitlement_keys
        .extend(keys.iter().map(|k| k.to_string()));
    profile
}

pub fn managed(mut profile: ProvisioningProfile) -> ProvisioningProfile {
    profile.managed = true;
    profile
}

pub fn target(bundle_id: &str, keys: &[&str]) -> BundleTarget {
    BundleTarget::new(bundle_id, keys.iter().copied())
}

/// Inputs for a `.mobileprovision` file.
pub struct ProfileFile<'a> {
    pub name: &'a str,
    pub uuid: &'a str,
    pub team_id: &'a str,
    pub bundle_id: &'a str,
    pub certificate_der: &'a [u8],
    pub devices: &'a [&'a str],
    pub get_task_allow: bool,
    pub provisions_all_devices: bool,
    pub xcode_managed: bool,
    pub platform: &'a str,
    pub expires_in_days: i64,
}

impl Default for ProfileFile<'_> {
    fn default() -> Self {
        Self {
            name: "Acme App Store",
            uuid: "11111111-1111-1111-1111-111111111111",
            team_id: "TEAM123456",
            bundle_id: "com.acme.app",
            certificate_der: b"certificate-der",
            devices: &[],
            get_task_allow: false,
            provisions_all_devices: false,
            xcode_managed: false,
            platform: "iOS",
            expires_in_days: 200,
        }
    }
}

impl ProfileFile<'_> {
    /// XML payload wrapped in stand-in CMS envelope bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut entitlements = Dictionary::new();
        entitlements.insert(
            "application-identifier".to_string(),
            Value::String(format!("{}.{}", self.team_id, self.bundle_id)),
        );
        entitlements.insert(
            "get-task-allow".to_string(),
            Value::Boolean(self.get_task_allow),
        );
        entitlements.insert(
            "aps-environment".to_string(),
            Value::String("production".to_string()),
        );

        let expiration = SystemTime::now()
            + std::time::Duration::from_secs(60 * 60 * 24 * self.expires_in_days.max(0) as u64);
        let expiration = if self.expires_in_days < 0 {
            SystemTime::now() - std::time::Duration::from_secs(60 * 60 * 24)
        } else {
            expiration
        };

        let mut dict = Dictionary::new();
        dict.insert("Name".to_string(), Value::String(self.name.to_string()));
        dict.insert("UUID".to_string(), Value::String(self.uuid.to_string()));
        dict.insert(
            "TeamIdentifier".to_string(),
            Value::Array(vec![Value::String(self.team_id.to_string())]),
        );
        dict.insert("TeamName".to_string(), Value::String("Acme Inc.".to_string()));
        dict.insert(
            "Platform".to_string(),
            Value::Array(vec![Value::String(self.platform.to_string())]),
        );
        dict.insert("Entitlements".to_string(), Value::Dictionary(entitlements));
        dict.insert(
            "DeveloperCertificates".to_string(),
            Value::Array(vec![Value::Data(self.certificate_der.to_vec())]),
        );
        dict.insert(
            "ExpirationDate".to_string(),
            Value::Date(plist::Date::from(expiration)),
        );
        if !self.devices.is_empty() {
            dict.insert(
                "ProvisionedDevices".to_string(),
                Value::Array(
                    self.devices
                        .iter()
                        .map(|d| Value::String(d.to_string()))
                        .collect(),
                ),
            );
        }
        if self.provisions_all_devices {
            dict.insert("ProvisionsAllDevices".to_string(), Value::Boolean(true));
        }
        if self.xcode_managed {
            dict.insert("IsXcodeManaged".to_string(), Value::Boolean(true));
        }

        let mut xml = Vec::new();
        Value::Dictionary(dict)
            .to_writer_xml(&mut xml)
            .expect("profile plist serializes");

        let mut bytes = b"0\x80\x06\x09*\x86H\x86\xf7\r\x01\x07\x02\xa0\x800\x80".to_vec();
        bytes.extend_from_slice(&xml);
        bytes.extend_from_slice(b"\x00\x00\xa0\x82\x0b");
        bytes
    }
}

/// Builder for a fake `.xcarchive` on disk.
pub struct ArchiveBuilder {
    root: PathBuf,
    app: PathBuf,
}

impl ArchiveBuilder {
    /// Creates `<dir>/MyApp.xcarchive` with a main app `com.acme.app`.
    pub fn new(dir: &Path) -> Self {
        let root = dir.join("MyApp.xcarchive");
        let app = root.join("Products/Applications/MyApp.app");

        let mut properties = Dictionary::new();
        properties.insert(
            "ApplicationPath".to_string(),
            Value::String("Applications/MyApp.app".to_string()),
        );
        let mut info = Dictionary::new();
        info.insert(
            "ApplicationProperties".to_string(),
            Value::Dictionary(properties),
        );
        write_plist(&root.join("Info.plist"), info);

        let builder = Self { root, app };
        builder.write_bundle(&builder.app.clone(), "com.acme.app", Some(&["aps-environment"]));
        builder.embed_profile(&ProfileFile::default());
        builder
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn app_path(&self) -> &Path {
        &self.app
    }

    pub fn embed_profile(&self, profile: &ProfileFile<'_>) {
        fs::write(self.app.join("embedded.mobileprovision"), profile.to_bytes())
            .expect("write embedded profile");
    }

    pub fn platform(&self, platform_name: &str) {
        let mut info = Dictionary::new();
        info.insert(
            "CFBundleIdentifier".to_string(),
            Value::String("com.acme.app".to_string()),
        );
        info.insert(
            "DTPlatformName".to_string(),
            Value::String(platform_name.to_string()),
        );
        write_plist(&self.app.join("Info.plist"), info);
    }

    pub fn plugin(&self, name: &str, bundle_id: &str, entitlements: Option<&[&str]>) -> &Self {
        let path = self.app.join("PlugIns").join(format!("{name}.appex"));
        self.write_bundle(&path, bundle_id, entitlements);
        self
    }

    pub fn watch_app(&self, name: &str, bundle_id: &str, entitlements: Option<&[&str]>) -> &Self {
        let path = self.app.join("Watch").join(format!("{name}.app"));
        self.write_bundle(&path, bundle_id, entitlements);
        self
    }

    pub fn clip(&self, name: &str, bundle_id: &str, entitlements: Option<&[&str]>) -> PathBuf {
        let path = self.app.join("AppClips").join(format!("{name}.app"));
        self.write_bundle(&path, bundle_id, entitlements);
        path
    }

    pub fn dsyms(&self) {
        let dsym = self.root.join("dSYMs/MyApp.app.dSYM/Contents");
        fs::create_dir_all(&dsym).expect("create dSYM");
        fs::write(dsym.join("Info.plist"), "dsym").expect("write dSYM");
    }

    pub fn write_bundle(&self, path: &Path, bundle_id: &str, entitlements: Option<&[&str]>) {
        let mut info = Dictionary::new();
        info.insert(
            "CFBundleIdentifier".to_string(),
            Value::String(bundle_id.to_string()),
        );
        info.insert(
            "DTPlatformName".to_string(),
            Value::String("iphoneos".to_string()),
        );
        write_plist(&path.join("Info.plist"), info);

        if let Some(keys) = entitlements {
            let mut dict = Dictionary::new();
            for key in keys {
                dict.insert(key.to_string(), Value::Boolean(true));
            }
            write_plist(&path.join("archived-expanded-entitlements.xcent"), dict);
        }
    }
}

pub fn write_plist(path: &Path, dict: Dictionary) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create plist parent");
    }
    Value::Dictionary(dict)
        .to_file_xml(path)
        .expect("write plist");
}

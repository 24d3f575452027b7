mod common;

use chrono::Utc;
use common::ProfileFile;
use std::fs;
use tempfile::TempDir;
use xcarchive_export::export::DistributionMethod;
use xcarchive_export::export::codesign::profile::{
    certificate_fingerprint, classify_export_method, is_xcode_managed_name,
};
use xcarchive_export::export::codesign::{
    InstalledProfileStore, ProfileKind, ProfileStore, ProvisioningProfile,
};

#[test]
fn decodes_mobileprovision_fields() {
    let bytes = ProfileFile {
        name: "Acme Ad Hoc",
        uuid: "AAAA-BBBB",
        devices: &["00008030-001A", "00008030-001B"],
        ..ProfileFile::default()
    }
    .to_bytes();

    let profile = ProvisioningProfile::from_mobileprovision(&bytes).unwrap();

    assert_eq!(profile.name, "Acme Ad Hoc");
    assert_eq!(profile.uuid, "AAAA-BBBB");
    assert_eq!(profile.team_id, "TEAM123456");
    assert_eq!(profile.team_name, "Acme Inc.");
    assert_eq!(profile.bundle_id_pattern, "com.acme.app");
    assert_eq!(profile.export_method, DistributionMethod::AdHoc);
    assert_eq!(profile.kind, ProfileKind::Ios);
    assert!(!profile.managed);
    assert!(profile.entitlement_keys.contains("aps-environment"));
    assert!(profile.expiration_date > Utc::now());
    assert!(profile.embeds_certificate(&certificate_fingerprint(b"certificate-der")));
}

#[test]
fn wildcard_application_identifier_keeps_its_pattern() {
    let bytes = ProfileFile {
        bundle_id: "*",
        provisions_all_devices: true,
        ..ProfileFile::default()
    }
    .to_bytes();

    let profile = ProvisioningProfile::from_mobileprovision(&bytes).unwrap();

    assert_eq!(profile.bundle_id_pattern, "*");
    assert_eq!(profile.export_method, DistributionMethod::Enterprise);
    assert!(profile.matches_bundle_id("com.acme.anything"));
}

#[test]
fn bundle_id_matching_is_exact_without_wildcard() {
    let bytes = ProfileFile::default().to_bytes();
    let profile = ProvisioningProfile::from_mobileprovision(&bytes).unwrap();

    assert!(profile.matches_bundle_id("com.acme.app"));
    assert!(!profile.matches_bundle_id("com.acme.app.widget"));
    assert!(!profile.matches_bundle_id("com.acme"));
}

#[test]
fn xcode_managed_flag_or_name_marks_managed() {
    let flagged = ProfileFile {
        xcode_managed: true,
        ..ProfileFile::default()
    }
    .to_bytes();
    let named = ProfileFile {
        name: "iOS Team Provisioning Profile: com.acme.app",
        ..ProfileFile::default()
    }
    .to_bytes();

    assert!(ProvisioningProfile::from_mobileprovision(&flagged).unwrap().managed);
    assert!(ProvisioningProfile::from_mobileprovision(&named).unwrap().managed);
}

#[test]
fn rejects_content_without_a_property_list() {
    assert!(ProvisioningProfile::from_mobileprovision(b"\x30\x80garbage").is_err());
}

#[test]
fn classifies_export_methods() {
    assert_eq!(classify_export_method(true, false, false), DistributionMethod::Enterprise);
    assert_eq!(classify_export_method(false, true, true), DistributionMethod::Development);
    assert_eq!(classify_export_method(false, true, false), DistributionMethod::AdHoc);
    assert_eq!(classify_export_method(false, false, false), DistributionMethod::AppStore);
}

#[test]
fn recognises_managed_profile_names() {
    assert!(is_xcode_managed_name("XC com.acme.app"));
    assert!(is_xcode_managed_name("XC: com.acme.app"));
    assert!(is_xcode_managed_name("iOS Team Provisioning Profile: *"));
    assert!(is_xcode_managed_name("tvOS Team Store Provisioning Profile: com.acme.tv"));
    assert!(!is_xcode_managed_name("Acme App Store"));
    assert!(!is_xcode_managed_name("iOS Team Distribution"));
}

#[test]
fn installed_store_filters_and_deduplicates() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();

    let app = ProfileFile::default().to_bytes();
    fs::write(first.join("app.mobileprovision"), &app).unwrap();
    fs::write(second.join("app-copy.mobileprovision"), &app).unwrap();
    fs::write(
        first.join("expired.mobileprovision"),
        ProfileFile {
            uuid: "expired",
            expires_in_days: -1,
            ..ProfileFile::default()
        }
        .to_bytes(),
    )
    .unwrap();
    fs::write(
        first.join("tv.mobileprovision"),
        ProfileFile {
            uuid: "tv",
            platform: "tvOS",
            ..ProfileFile::default()
        }
        .to_bytes(),
    )
    .unwrap();
    fs::write(first.join("broken.mobileprovision"), b"not a profile").unwrap();
    fs::write(first.join("notes.txt"), b"ignored").unwrap();

    let store = InstalledProfileStore::with_directories(vec![
        first,
        second,
        dir.path().join("missing"),
    ]);

    let ios = store.list_installed(ProfileKind::Ios).unwrap();
    assert_eq!(ios.len(), 1);
    assert_eq!(ios[0].uuid, "11111111-1111-1111-1111-111111111111");

    let tv = store.list_installed(ProfileKind::Tvos).unwrap();
    assert_eq!(tv.len(), 1);
    assert_eq!(tv[0].uuid, "tv");
}

mod common;

use common::{certificate, managed, profile};
use std::collections::BTreeMap;
use xcarchive_export::export::DistributionMethod;
use xcarchive_export::export::codesign::{ResolvedGroup, SigningStyle};
use xcarchive_export::export::options::{
    ExportConfigSynthesizer, ExportOptions, validate_custom_export_options,
};

fn group(method: DistributionMethod, managed_profiles: bool) -> ResolvedGroup {
    let cert = certificate("Apple Distribution: Acme (TEAM1)", "TEAM1", "01");
    let app = profile("Acme App", "uuid-1", "com.acme.app", method, &cert);
    let app = if managed_profiles { managed(app) } else { app };

    ResolvedGroup {
        certificate: cert,
        profiles: BTreeMap::from([("com.acme.app".to_string(), app)]),
    }
}

#[test]
fn signing_fields_are_omitted_before_xcode_9() {
    let group = group(DistributionMethod::AdHoc, false);

    let options = ExportConfigSynthesizer::new(DistributionMethod::AdHoc, 8)
        .primary_bundle_id("com.acme.app")
        .synthesize(Some(&group));

    assert!(!options.has_signing_fields());
    assert_eq!(options.compile_bitcode, Some(true));
    assert_eq!(options.distribution_bundle_identifier, None);

    let xml = options.to_plist_string().expect("serializes");
    assert!(!xml.contains("provisioningProfiles"));
    assert!(!xml.contains("teamID"));
    assert!(!xml.contains("signingCertificate"));
}

#[test]
fn signing_fields_come_from_the_group() {
    let group = group(DistributionMethod::AdHoc, false);

    let options = ExportConfigSynthesizer::new(DistributionMethod::AdHoc, 9).synthesize(Some(&group));

    assert_eq!(options.team_id.as_deref(), Some("TEAM1"));
    assert_eq!(
        options.signing_certificate.as_deref(),
        Some("Apple Distribution: Acme (TEAM1)")
    );
    assert_eq!(
        options.provisioning_profiles,
        Some(BTreeMap::from([("com.acme.app".to_string(), "Acme App".to_string())]))
    );
    assert_eq!(options.signing_style, None);
}

#[test]
fn distribution_bundle_identifier_requires_xcode_12() {
    let at_11 = ExportConfigSynthesizer::new(DistributionMethod::Enterprise, 11)
        .primary_bundle_id("com.acme.app")
        .synthesize(None);
    let at_12 = ExportConfigSynthesizer::new(DistributionMethod::Enterprise, 12)
        .primary_bundle_id("com.acme.app")
        .synthesize(None);
    let app_store = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 15)
        .primary_bundle_id("com.acme.app")
        .synthesize(None);

    assert_eq!(at_11.distribution_bundle_identifier, None);
    assert_eq!(at_12.distribution_bundle_identifier.as_deref(), Some("com.acme.app"));
    assert_eq!(app_store.distribution_bundle_identifier, None);
}

#[test]
fn version_management_requires_xcode_13_and_app_store() {
    let at_12 = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 12)
        .manage_version_and_build_number(true)
        .synthesize(None);
    let at_13 = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 13)
        .manage_version_and_build_number(true)
        .synthesize(None);
    let ad_hoc = ExportConfigSynthesizer::new(DistributionMethod::AdHoc, 13)
        .manage_version_and_build_number(true)
        .synthesize(None);

    assert_eq!(at_12.manage_app_version_and_build_number, None);
    assert_eq!(at_13.manage_app_version_and_build_number, Some(true));
    assert_eq!(ad_hoc.manage_app_version_and_build_number, None);
}

#[test]
fn bitcode_flags_follow_the_method() {
    let app_store = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 14)
        .upload_bitcode(false)
        .synthesize(None);
    let development = ExportConfigSynthesizer::new(DistributionMethod::Development, 14)
        .compile_bitcode(false)
        .synthesize(None);

    assert_eq!(app_store.upload_bitcode, Some(false));
    assert_eq!(app_store.compile_bitcode, None);
    assert_eq!(development.compile_bitcode, Some(false));
    assert_eq!(development.upload_bitcode, None);
}

#[test]
fn managed_archive_with_manual_group_forces_manual_signing() {
    let group = group(DistributionMethod::AppStore, false);

    let options = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 14)
        .archive_managed(true)
        .synthesize(Some(&group));

    assert_eq!(options.signing_style, Some(SigningStyle::Manual));
    let xml = options.to_plist_string().expect("serializes");
    assert!(xml.contains("<key>signingStyle</key>"));
    assert!(xml.contains("<string>manual</string>"));
}

#[test]
fn managed_archive_with_managed_group_leaves_signing_style_unset() {
    let group = group(DistributionMethod::AppStore, true);

    let options = ExportConfigSynthesizer::new(DistributionMethod::AppStore, 14)
        .archive_managed(true)
        .synthesize(Some(&group));

    assert_eq!(options.signing_style, None);
}

#[test]
fn serialization_is_stable_and_parses_back() {
    let group = group(DistributionMethod::AdHoc, false);
    let options = ExportConfigSynthesizer::new(DistributionMethod::AdHoc, 15)
        .primary_bundle_id("com.acme.app")
        .synthesize(Some(&group));

    let first = options.to_plist_string().expect("serializes");
    let second = options.to_plist_string().expect("serializes");
    assert_eq!(first, second);
    assert!(first.contains("<key>method</key>"));
    assert!(first.contains("<string>ad-hoc</string>"));
    assert!(first.contains("<key>teamID</key>"));
    assert!(!first.contains("uploadBitcode"));
    assert!(!first.contains("manageAppVersionAndBuildNumber"));

    let parsed = ExportOptions::from_plist_str(&first).expect("parses");
    assert_eq!(parsed, options);
}

#[test]
fn method_only_document_has_a_single_key() {
    let xml = ExportOptions::new(DistributionMethod::Development)
        .to_plist_string()
        .expect("serializes");

    assert_eq!(xml.matches("<key>").count(), 1);
    assert!(xml.contains("<string>development</string>"));
}

#[test]
fn custom_export_options_are_validated() {
    let valid = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>method</key>
    <string>enterprise</string>
</dict>
</plist>
"#;
    assert!(validate_custom_export_options(valid).is_ok());

    let array = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<array><string>method</string></array>
</plist>"#;
    let missing_method = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict><key>teamID</key><string>TEAM1</string></dict>
</plist>"#;

    for content in [array, missing_method, "definitely not a plist"] {
        let err = validate_custom_export_options(content).expect_err("rejected");
        assert!(err.to_string().contains("Configuration error"), "{err}");
    }
}

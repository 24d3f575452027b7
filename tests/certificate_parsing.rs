mod common;

use chrono::{Duration, TimeZone, Utc};
use common::certificate;
use xcarchive_export::export::Error;
use xcarchive_export::export::codesign::KeychainCertificateStore;
use xcarchive_export::export::codesign::certificate::{
    filter_valid, parse_find_identity_output, parse_openssl_date, parse_openssl_fields,
    split_pem_blocks,
};

#[test]
fn parses_find_identity_output() {
    let output = r#"
Policy: Code Signing
  Matching identities
  1) 0A1B2C3D4E5F60718293A4B5C6D7E8F901234567 "Apple Distribution: Acme Corp (TEAM123456)"
  2) ffeeddccbbaa99887766554433221100ffeeddcc "Apple Development: Jane Doe (ABCDE12345)"
     2 valid identities found
"#;

    let identities = parse_find_identity_output(output);

    assert_eq!(identities.len(), 2);
    assert_eq!(identities[0].fingerprint, "0A1B2C3D4E5F60718293A4B5C6D7E8F901234567");
    assert_eq!(identities[0].name, "Apple Distribution: Acme Corp (TEAM123456)");
    assert_eq!(identities[1].fingerprint, "FFEEDDCCBBAA99887766554433221100FFEEDDCC");
}

#[test]
fn find_identity_without_identities_is_empty() {
    assert!(parse_find_identity_output("     0 valid identities found\n").is_empty());
}

#[test]
fn splits_pem_blocks_by_hash() {
    let output = "\
SHA-256 hash: 00
SHA-1 hash: abcdef
keychain: \"/Users/ci/Library/Keychains/login.keychain-db\"
-----BEGIN CERTIFICATE-----
MIIB
-----END CERTIFICATE-----
SHA-1 hash: 123456
-----BEGIN CERTIFICATE-----
MIIC
-----END CERTIFICATE-----
";

    let blocks = split_pem_blocks(output);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].0, "ABCDEF");
    assert_eq!(
        blocks[0].1,
        "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n"
    );
    assert_eq!(blocks[1].0, "123456");
}

#[test]
fn parses_openssl_subject_and_validity() {
    let output = "\
subject=UID=TEAM123456,CN=Apple Distribution: Acme\\, Inc. (TEAM123456),OU=TEAM123456,O=Acme\\, Inc.,C=US
serial=1a2b3c
notBefore=Jan  5 10:00:00 2024 GMT
notAfter=Jan  4 10:00:00 2025 GMT
";

    let fields = parse_openssl_fields(output);

    assert_eq!(
        fields.common_name.as_deref(),
        Some("Apple Distribution: Acme, Inc. (TEAM123456)")
    );
    assert_eq!(fields.team_id.as_deref(), Some("TEAM123456"));
    assert_eq!(fields.team_name.as_deref(), Some("Acme, Inc."));
    assert_eq!(fields.serial.as_deref(), Some("1A2B3C"));
    assert_eq!(
        fields.not_before,
        Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap())
    );
    assert_eq!(
        fields.not_after,
        Some(Utc.with_ymd_and_hms(2025, 1, 4, 10, 0, 0).unwrap())
    );
}

#[test]
fn rejects_malformed_dates() {
    assert_eq!(
        parse_openssl_date("Dec 31 23:59:59 2030 GMT"),
        Some(Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap())
    );
    assert_eq!(parse_openssl_date("31/12/2030"), None);
}

#[test]
fn keeps_only_currently_valid_certificates() {
    let now = Utc::now();
    let valid = certificate("Valid", "TEAM1", "01");
    let mut expired = certificate("Expired", "TEAM1", "02");
    expired.not_after = now - Duration::days(1);
    let mut future = certificate("Future", "TEAM1", "03");
    future.not_before = now + Duration::days(1);

    let kept = filter_valid(vec![valid.clone(), expired, future], now);

    assert_eq!(kept, vec![valid]);
}

#[test]
fn keychain_store_needs_a_runtime() {
    let err = KeychainCertificateStore::new().unwrap_err();

    assert!(matches!(err, Error::StoreUnavailable(_)), "{err}");
}

#[tokio::test]
async fn keychain_store_binds_from_the_blocking_pool() {
    let created = tokio::task::spawn_blocking(|| KeychainCertificateStore::new().is_ok())
        .await
        .unwrap();

    assert!(created);
}

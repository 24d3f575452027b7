mod common;

use assert_cmd::Command;
use common::ArchiveBuilder;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const STEP_ENV: [&str; 12] = [
    "archive_path",
    "distribution_method",
    "product",
    "export_development_team",
    "upload_bitcode",
    "compile_bitcode",
    "manage_version_and_build_number",
    "export_options_plist_content",
    "BITRISE_DEPLOY_DIR",
    "BITRISE_DEFAULT_PROVISION_URL",
    "use_legacy_export",
    "legacy_export_provisioning_profile_name",
];

fn exporter() -> Command {
    let mut cmd = Command::cargo_bin("xcarchive_export").unwrap();
    for key in STEP_ENV {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_the_inputs() {
    exporter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--archive-path"))
        .stdout(predicate::str::contains("--distribution-method"))
        .stdout(predicate::str::contains("--export-options-plist-content"))
        .stdout(predicate::str::contains("--legacy-export"));
}

#[test]
fn missing_archive_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();

    exporter()
        .arg("--archive-path")
        .arg(dir.path().join("Missing.xcarchive"))
        .args(["--distribution-method", "app-store", "--xcodebuild-version", "15"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("archive does not exist"));
}

#[test]
fn unknown_method_is_rejected_by_the_parser() {
    exporter()
        .args(["--distribution-method", "beta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown distribution method"));
}

#[test]
fn zero_xcode_version_is_invalid() {
    let dir = TempDir::new().unwrap();

    exporter()
        .arg("--archive-path")
        .arg(dir.path())
        .args(["--distribution-method", "app-store", "--xcodebuild-version", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid arguments"));
}

#[test]
fn dry_run_with_custom_options_from_the_environment() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());
    let deploy = dir.path().join("deploy");
    let options = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>method</key>
	<string>enterprise</string>
</dict>
</plist>"#;

    exporter()
        .env("archive_path", archive.path())
        .env("distribution_method", "enterprise")
        .env("export_options_plist_content", options)
        .env("BITRISE_DEPLOY_DIR", &deploy)
        .args(["--xcodebuild-version", "15", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export options: custom"));

    assert_eq!(
        fs::read_to_string(deploy.join("export_options.plist")).unwrap(),
        options
    );
}

#[test]
fn dry_run_generates_options_without_signing_for_xcode_8() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());
    let deploy = dir.path().join("deploy");

    exporter()
        .arg("--archive-path")
        .arg(archive.path())
        .arg("--deploy-dir")
        .arg(&deploy)
        .args([
            "--distribution-method",
            "ad-hoc",
            "--compile-bitcode",
            "no",
            "--xcodebuild-version",
            "8",
            "--dry-run",
        ])
        .assert()
        .success();

    let written = fs::read_to_string(deploy.join("export_options.plist")).unwrap();
    assert!(written.contains("<string>ad-hoc</string>"));
    assert!(written.contains("<key>compileBitcode</key>"));
    assert!(!written.contains("teamID"));
}

#[test]
fn legacy_dry_run_from_the_environment_skips_export_options() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());
    let deploy = dir.path().join("deploy");

    exporter()
        .env("archive_path", archive.path())
        .env("distribution_method", "ad-hoc")
        .env("use_legacy_export", "yes")
        .env("legacy_export_provisioning_profile_name", "Acme Ad Hoc")
        .env("BITRISE_DEPLOY_DIR", &deploy)
        .args(["--xcodebuild-version", "7", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy export profile: Acme Ad Hoc"))
        .stdout(predicate::str::contains("Legacy export with profile 'Acme Ad Hoc'"));

    assert!(!deploy.join("export_options.plist").exists());
}

#[test]
fn auto_detect_method_is_accepted() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());
    let deploy = dir.path().join("deploy");

    exporter()
        .arg("--archive-path")
        .arg(archive.path())
        .arg("--deploy-dir")
        .arg(&deploy)
        .args([
            "--distribution-method",
            "auto-detect",
            "--xcodebuild-version",
            "8",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("export method: app-store"));

    let written = fs::read_to_string(deploy.join("export_options.plist")).unwrap();
    assert!(written.contains("<string>app-store</string>"));
}

#[test]
fn invalid_custom_options_fail() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());

    exporter()
        .arg("--archive-path")
        .arg(archive.path())
        .arg("--deploy-dir")
        .arg(dir.path().join("deploy"))
        .args([
            "--distribution-method",
            "app-store",
            "--export-options-plist-content",
            "not a plist",
            "--xcodebuild-version",
            "15",
            "--dry-run",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn settings_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    let archive = ArchiveBuilder::new(dir.path());
    let deploy = dir.path().join("deploy");
    let settings = dir.path().join("export.toml");
    fs::write(
        &settings,
        format!(
            "archive_path = \"{}\"\ndeploy_dir = \"{}\"\ndistribution_method = \"development\"\nxcodebuild_major_version = 8\n",
            archive.path().display(),
            deploy.display()
        ),
    )
    .unwrap();

    exporter()
        .arg("--settings")
        .arg(&settings)
        .arg("--dry-run")
        .assert()
        .success();

    let written = fs::read_to_string(deploy.join("export_options.plist")).unwrap();
    assert!(written.contains("<string>development</string>"));
}

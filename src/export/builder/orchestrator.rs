//! Export orchestration.
//!
//! This module provides the [`Exporter`] that writes the export options, runs
//! `xcodebuild -exportArchive` and relocates its output. A legacy export skips
//! the export options and names one provisioning profile instead.

use super::checksum::calculate_sha256;
use super::tool_detection::{detect_xcodebuild_version, find_xcodebuild};
use super::{ArtifactKind, ExportedArtifact};
use crate::export::archive::{ArchiveReader, XcArchive};
use crate::export::codesign::{
    InstalledProfileStore, KeychainCertificateStore, ProvisioningProfile, fetch_default_profile,
};
use crate::export::options::validate_custom_export_options;
use crate::export::plan::{ExportPlan, PlanInputs, plan_export};
use crate::export::utils::{compress::zip_dir, fs};
use crate::export::{Context, Error, ExportSettings, Result, error::ErrorExt};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// File name of the export options written to the deploy directory.
pub const EXPORT_OPTIONS_FILE: &str = "export_options.plist";

/// File name of the JSON resolution report written to the deploy directory.
pub const RESOLUTION_REPORT_FILE: &str = "codesign_resolution.json";

/// File name of the zipped IDEDistribution logs.
pub const DISTRIBUTION_LOGS_ZIP: &str = "xcodebuild.xcdistributionlogs.zip";

const DISTRIBUTION_LOGS_PATTERN: &str = r"IDEDistribution: -\[IDEDistributionLogging _createLoggingBundleAtPath:\]: Created bundle at path '(?P<log_path>.*)'";

/// Last Xcode accepting `-exportFormat`.
pub const LEGACY_EXPORT_MAX_XCODE: u32 = 8;

/// Result of an export run.
#[derive(Debug)]
pub struct ExportOutcome {
    /// `None` for a legacy export.
    pub export_options_path: Option<PathBuf>,
    /// `None` when a custom export options document was used.
    pub plan: Option<ExportPlan>,
    pub legacy: Option<LegacyExport>,
    pub artifacts: Vec<ExportedArtifact>,
}

/// An `xcodebuild -exportArchive -exportFormat ipa` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyExport {
    pub profile_name: String,
    pub ipa_path: PathBuf,
}

impl LegacyExport {
    /// Arguments passed to `xcodebuild` for `archive_path`.
    pub fn xcodebuild_args(&self, archive_path: &Path) -> Vec<OsString> {
        vec![
            "-exportArchive".into(),
            "-exportFormat".into(),
            "ipa".into(),
            "-archivePath".into(),
            archive_path.into(),
            "-exportPath".into(),
            self.ipa_path.clone().into(),
            "-exportProvisioningProfile".into(),
            self.profile_name.clone().into(),
        ]
    }
}

/// Exports an archive with `xcodebuild`.
///
/// # Examples
///
/// ```no_run
/// use xcarchive_export::export::{DistributionMethod, Exporter, SettingsBuilder};
///
/// # async fn example() -> xcarchive_export::export::Result<()> {
/// let settings = SettingsBuilder::new()
///     .archive_path("build/MyApp.xcarchive")
///     .distribution_method(DistributionMethod::AppStore)
///     .build()?;
///
/// let outcome = Exporter::new(settings).export().await?;
/// for artifact in outcome.artifacts {
///     println!("{}: {} ({} bytes)", artifact.kind, artifact.path.display(), artifact.size);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exporter {
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    /// Runs the export.
    ///
    /// Stops after writing the export options when the settings ask for a dry
    /// run. A legacy export stops before running `xcodebuild` instead.
    pub async fn export(&self) -> Result<ExportOutcome> {
        let deploy_dir = self.settings.deploy_dir();
        fs::create_dir_all(deploy_dir).await?;

        let xcodebuild_major = match self.settings.xcodebuild_major_version() {
            Some(major) => major,
            None => {
                let version = detect_xcodebuild_version().await?;
                log::info!("Xcode {}.{} detected", version.major, version.minor);
                version.major
            }
        };
        self.settings.ensure_product_supported(xcodebuild_major)?;

        if self.settings.legacy_export() {
            return self.export_legacy(xcodebuild_major).await;
        }

        let export_options_path = deploy_dir.join(EXPORT_OPTIONS_FILE);
        let mut artifacts = Vec::new();

        let plan = match self.settings.custom_export_options() {
            Some(content) => {
                validate_custom_export_options(content)?;
                log::info!("Using custom export options:\n{}", content);
                fs::write_file(&export_options_path, content.as_bytes()).await?;
                None
            }
            None => {
                let plan = self.plan(xcodebuild_major).await?;
                let content = plan.options.to_plist_string()?;
                log::info!("Generated export options:\n{}", content);
                fs::write_file(&export_options_path, content.as_bytes()).await?;

                if let Some(resolution) = &plan.resolution {
                    resolution.report.log();
                    let report_path = deploy_dir.join(RESOLUTION_REPORT_FILE);
                    let json = serde_json::to_vec_pretty(&resolution.report).map_err(|e| {
                        Error::Serialization(format!("resolution report: {}", e))
                    })?;
                    fs::write_file(&report_path, &json).await?;
                    artifacts.push(artifact(ArtifactKind::ResolutionReport, report_path).await?);
                }
                Some(plan)
            }
        };
        artifacts.push(artifact(ArtifactKind::ExportOptions, export_options_path.clone()).await?);

        if self.settings.dry_run() {
            log::info!("Dry run: export options written to {}", export_options_path.display());
            return Ok(ExportOutcome {
                export_options_path: Some(export_options_path),
                plan,
                legacy: None,
                artifacts,
            });
        }

        let export_dir = std::env::temp_dir().join(format!("__export__{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&export_dir).await?;

        let exported = self.run_xcodebuild(&export_options_path, &export_dir).await;
        let relocated = match exported {
            Ok(()) => self.collect_artifacts(&export_dir).await,
            Err(e) => Err(e),
        };
        if let Err(e) = fs::remove_dir_all(&export_dir).await {
            log::warn!("Failed to remove {}: {}", export_dir.display(), e);
        }
        artifacts.extend(relocated?);
        artifacts.extend(self.export_dsyms().await?);

        Ok(ExportOutcome {
            export_options_path: Some(export_options_path),
            plan,
            legacy: None,
            artifacts,
        })
    }

    async fn export_legacy(&self, xcodebuild_major: u32) -> Result<ExportOutcome> {
        if xcodebuild_major > LEGACY_EXPORT_MAX_XCODE {
            log::warn!(
                "Xcode {} may no longer accept -exportFormat; legacy export was removed after Xcode {}",
                xcodebuild_major,
                LEGACY_EXPORT_MAX_XCODE
            );
        }

        let profile_name = match self.settings.legacy_profile_name() {
            Some(name) => {
                log::info!("Using provisioning profile: {}", name);
                name.to_string()
            }
            None => {
                let name = self.embedded_profile_name().await?;
                log::info!("Using embedded provisioning profile: {}", name);
                name
            }
        };

        let archive_path = self.settings.archive_path();
        let legacy = LegacyExport {
            profile_name,
            ipa_path: self
                .settings
                .deploy_dir()
                .join(format!("{}.ipa", archive_name(archive_path))),
        };
        let args = legacy.xcodebuild_args(archive_path);
        log::info!(
            "$ xcodebuild {}",
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        if self.settings.dry_run() {
            log::info!("Dry run: legacy export not started");
            return Ok(ExportOutcome {
                export_options_path: None,
                plan: None,
                legacy: Some(legacy),
                artifacts: Vec::new(),
            });
        }

        let xcodebuild = find_xcodebuild()?;
        let output = tokio::process::Command::new(&xcodebuild)
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::GenericError(format!("Failed to execute xcodebuild: {}", e)))?;
        if !output.status.success() {
            return Err(export_failure(&output));
        }

        let mut artifacts = vec![artifact(ArtifactKind::Ipa, legacy.ipa_path.clone()).await?];
        artifacts.extend(self.export_dsyms().await?);

        Ok(ExportOutcome {
            export_options_path: None,
            plan: None,
            legacy: Some(legacy),
            artifacts,
        })
    }

    async fn embedded_profile_name(&self) -> Result<String> {
        let archive_path = self.settings.archive_path().to_path_buf();
        let product = self.settings.product();
        let original = tokio::task::spawn_blocking(move || {
            XcArchive::open(&archive_path)?.original_signing_profile(product)
        })
        .await
        .map_err(|e| Error::GenericError(format!("Archive task panicked: {}", e)))??;

        if original.name.trim().is_empty() {
            return Err(Error::ArchiveMalformed("embedded profile has no name".to_string()));
        }
        Ok(original.name)
    }

    async fn plan(&self, xcodebuild_major: u32) -> Result<ExportPlan> {
        let default_profile = self.default_profile().await;

        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            let archive = XcArchive::open(settings.archive_path())?;
            let certificates = KeychainCertificateStore::new()?;
            let profiles = InstalledProfileStore::new()?;

            plan_export(
                &settings,
                PlanInputs {
                    certificates: &certificates,
                    profiles: &profiles,
                    archive: &archive,
                    default_profile: default_profile.as_ref(),
                    xcodebuild_major,
                },
            )
        })
        .await
        .map_err(|e| Error::GenericError(format!("Planning task panicked: {}", e)))?
    }

    /// The fallback profile is only consulted when no team id was supplied.
    async fn default_profile(&self) -> Option<ProvisioningProfile> {
        if self.settings.team_id().is_some() {
            return None;
        }
        let url = self.settings.default_profile_url()?;
        fetch_default_profile(url).await
    }

    async fn run_xcodebuild(&self, export_options_path: &Path, export_dir: &Path) -> Result<()> {
        let xcodebuild = find_xcodebuild()?;
        let args: [&OsStr; 7] = [
            OsStr::new("-exportArchive"),
            OsStr::new("-archivePath"),
            self.settings.archive_path().as_os_str(),
            OsStr::new("-exportPath"),
            export_dir.as_os_str(),
            OsStr::new("-exportOptionsPlist"),
            export_options_path.as_os_str(),
        ];

        log::info!(
            "$ xcodebuild -exportArchive -archivePath {} -exportPath {} -exportOptionsPlist {}",
            self.settings.archive_path().display(),
            export_dir.display(),
            export_options_path.display()
        );

        let output = tokio::process::Command::new(&xcodebuild)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::GenericError(format!("Failed to execute xcodebuild: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        self.export_distribution_logs(&combined_output(&output)).await;
        Err(export_failure(&output))
    }

    async fn export_distribution_logs(&self, xcodebuild_output: &str) {
        let Some(logs_dir) = find_distribution_logs_path(xcodebuild_output) else {
            log::warn!("No IDEDistribution logs referenced in xcodebuild output");
            return;
        };

        let destination = self.settings.deploy_dir().join(DISTRIBUTION_LOGS_ZIP);
        match zip_dir(&logs_dir, &destination).await {
            Ok(()) => log::warn!(
                "If the reason of the failure is not in the log, check the distribution logs at {}",
                destination.display()
            ),
            Err(e) => log::warn!("Failed to export distribution logs: {}", e),
        }
    }

    async fn collect_artifacts(&self, export_dir: &Path) -> Result<Vec<ExportedArtifact>> {
        let deploy_dir = self.settings.deploy_dir();
        let archive_name = archive_name(self.settings.archive_path());
        let mut artifacts = Vec::new();

        let pattern = export_dir.join("*.ipa");
        let pattern = pattern.to_string_lossy();
        let mut ipas: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| Error::GenericError(format!("Invalid ipa pattern {}: {}", pattern, e)))?
            .filter_map(|entry| entry.ok())
            .collect();
        ipas.sort();

        match ipas.as_slice() {
            [] => return Err(Error::ExportFailed(format!("No ipa found with pattern: {}", pattern))),
            [ipa] => {
                let destination = deploy_dir.join(format!("{archive_name}.ipa"));
                fs::copy_file(ipa, &destination).await?;
                artifacts.push(artifact(ArtifactKind::Ipa, destination).await?);
            }
            many => {
                log::warn!("More than 1 .ipa file found");
                for ipa in many {
                    let file_name = ipa.file_name().context("ipa path has no file name")?;
                    let destination = deploy_dir.join(file_name);
                    fs::copy_file(ipa, &destination).await?;
                    artifacts.push(artifact(ArtifactKind::Ipa, destination).await?);
                }
            }
        }

        Ok(artifacts)
    }

    async fn export_dsyms(&self) -> Result<Option<ExportedArtifact>> {
        let archive_path = self.settings.archive_path();
        let dsyms_dir = archive_path.join("dSYMs");
        if !dsyms_dir.is_dir() {
            log::warn!("No dSYMs found in {}", archive_path.display());
            return Ok(None);
        }

        let destination = self
            .settings
            .deploy_dir()
            .join(format!("{}.dSYM.zip", archive_name(archive_path)));
        zip_dir(&dsyms_dir, &destination).await?;
        Ok(Some(artifact(ArtifactKind::DsymZip, destination).await?))
    }
}

/// Extracts the IDEDistribution logs bundle path from `xcodebuild` output.
pub fn find_distribution_logs_path(output: &str) -> Option<PathBuf> {
    let re = Regex::new(DISTRIBUTION_LOGS_PATTERN).ok()?;
    output.lines().find_map(|line| {
        re.captures(line)
            .and_then(|captures| captures.name("log_path"))
            .map(|m| PathBuf::from(m.as_str()))
    })
}

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// The exit status and the last 20 output lines.
fn export_failure(output: &std::process::Output) -> Error {
    let combined = combined_output(output);
    let tail: Vec<&str> = combined.lines().rev().take(20).collect();
    let tail: Vec<&str> = tail.into_iter().rev().collect();
    Error::ExportFailed(format!(
        "xcodebuild exited with status {}:\n{}",
        output.status.code().unwrap_or(-1),
        tail.join("\n")
    ))
}

fn archive_name(archive_path: &Path) -> String {
    archive_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string())
}

async fn artifact(kind: ArtifactKind, path: PathBuf) -> Result<ExportedArtifact> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .fs_context("reading artifact metadata", &path)?;
    let checksum = calculate_sha256(&path).await?;

    Ok(ExportedArtifact {
        kind,
        path,
        size: metadata.len(),
        checksum,
    })
}

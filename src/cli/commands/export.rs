//! The export command.

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::export::builder::orchestrator::RESOLUTION_REPORT_FILE;
use crate::export::codesign::DiagnosticKind;
use crate::export::{ExportOutcome, ExportSettings, Exporter};

/// Builds settings from `args`, runs the export and reports the outcome.
///
/// Signing diagnostics are printed but never change the exit code.
pub async fn execute_export(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let settings = args.settings_builder()?.build()?;
    print_settings(&settings, config)?;

    config.section("Exporting archive")?;
    if settings.legacy_export() {
        config.progress("Legacy export with -exportFormat ipa")?;
    } else if settings.dry_run() {
        config.progress("Dry run: writing export options only")?;
    } else {
        config.progress("Running xcodebuild -exportArchive")?;
    }
    let outcome = Exporter::new(settings).export().await?;

    print_outcome(&outcome, config)?;
    Ok(0)
}

fn print_settings(settings: &ExportSettings, config: &RuntimeConfig) -> Result<()> {
    config.section("Configuration")?;
    config.indent(&format!("archive: {}", settings.archive_path().display()))?;
    config.indent(&format!("distribution method: {}", settings.distribution_method()))?;
    config.indent(&format!("product: {}", settings.product()))?;
    config.indent(&format!("team id: {}", settings.team_id().unwrap_or("-")))?;
    config.indent(&format!("deploy dir: {}", settings.deploy_dir().display()))?;
    if let Some(major) = settings.xcodebuild_major_version() {
        config.indent(&format!("xcode major version: {major}"))?;
    }
    if settings.legacy_export() {
        config.indent(&format!(
            "legacy export profile: {}",
            settings.legacy_profile_name().unwrap_or("embedded")
        ))?;
    } else if settings.custom_export_options().is_some() {
        config.indent("export options: custom")?;
    }
    config.verbose_println(&format!(
        "upload bitcode: {}, compile bitcode: {}, manage version: {}",
        settings.upload_bitcode(),
        settings.compile_bitcode(),
        settings.manage_version_and_build_number()
    ))?;
    Ok(())
}

fn print_outcome(outcome: &ExportOutcome, config: &RuntimeConfig) -> Result<()> {
    if let Some(plan) = &outcome.plan {
        config.indent(&format!("export method: {}", plan.method))?;
    }
    if let Some(resolution) = outcome.plan.as_ref().and_then(|p| p.resolution.as_ref()) {
        match &resolution.group {
            Some(group) => config.success(&format!(
                "Code signing group: {} [{}]",
                group.certificate.common_name, group.certificate.team_id
            ))?,
            None => config.warn("No code signing group found; xcodebuild resolves signing")?,
        }
        let skipped = resolution
            .report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::StepSkipped)
            .count();
        if skipped > 0 {
            config.warn(&format!(
                "{skipped} resolution filter(s) skipped, see {RESOLUTION_REPORT_FILE}"
            ))?;
        }
    }

    if let Some(path) = &outcome.export_options_path {
        config.success(&format!("Export options written to {}", path.display()))?;
    }
    if let Some(legacy) = &outcome.legacy {
        config.success(&format!(
            "Legacy export with profile '{}' to {}",
            legacy.profile_name,
            legacy.ipa_path.display()
        ))?;
    }

    config.section("Artifacts")?;
    for artifact in &outcome.artifacts {
        config.indent(&format!(
            "{}: {} ({} bytes)",
            artifact.kind,
            artifact.path.display(),
            artifact.size
        ))?;
        config.verbose_println(&format!("    sha256: {}", artifact.checksum))?;
    }
    Ok(())
}

//! Command line argument parsing and validation.
//!
//! Every input can also be supplied through the environment variable the
//! pipeline step exposes, so the binary runs unchanged as a CI step.

use crate::export::{ExportProduct, MethodSelection, SettingsBuilder, SettingsFile};
use clap::Parser;
use std::path::PathBuf;

/// Xcode archive exporter
#[derive(Parser, Debug)]
#[command(
    name = "xcarchive_export",
    version,
    about = "Exports an Xcode archive with automatically resolved code signing",
    long_about = "Exports an .xcarchive into an installable package.

Picks a signing certificate and one provisioning profile per bundle target from the
installed signing material, writes export_options.plist and runs xcodebuild -exportArchive.

Usage:
  xcarchive_export --archive-path build/MyApp.xcarchive --distribution-method app-store
  xcarchive_export --archive-path build/MyApp.xcarchive --distribution-method ad-hoc --team-id ABCDE12345
  xcarchive_export --settings export.toml --dry-run
  xcarchive_export --archive-path build/MyApp.xcarchive --distribution-method ad-hoc --legacy-export yes

Exit code 0 = export succeeded; signing diagnostics never change the exit code."
)]
pub struct Args {
    /// Path of the .xcarchive to export
    #[arg(long, env = "archive_path", value_name = "PATH")]
    pub archive_path: Option<PathBuf>,

    /// Distribution method: development, ad-hoc, enterprise, app-store, auto-detect
    #[arg(long, env = "distribution_method", value_name = "METHOD")]
    pub distribution_method: Option<MethodSelection>,

    /// Product to export: app, app-clip
    #[arg(long, env = "product", value_name = "PRODUCT")]
    pub product: Option<ExportProduct>,

    /// Developer team to sign with
    #[arg(long, env = "export_development_team", value_name = "TEAM_ID")]
    pub team_id: Option<String>,

    /// Upload bitcode with App Store exports (yes/no)
    #[arg(long, env = "upload_bitcode", value_name = "BOOL", value_parser = parse_flag)]
    pub upload_bitcode: Option<bool>,

    /// Recompile bitcode for non App Store exports (yes/no)
    #[arg(long, env = "compile_bitcode", value_name = "BOOL", value_parser = parse_flag)]
    pub compile_bitcode: Option<bool>,

    /// Let App Store Connect manage version and build number (yes/no)
    #[arg(
        long,
        env = "manage_version_and_build_number",
        value_name = "BOOL",
        value_parser = parse_flag
    )]
    pub manage_version_and_build_number: Option<bool>,

    /// Complete export options property list, used instead of generating one
    #[arg(long, env = "export_options_plist_content", value_name = "PLIST")]
    pub export_options_plist_content: Option<String>,

    /// Directory receiving the export options and artifacts
    #[arg(long, env = "BITRISE_DEPLOY_DIR", value_name = "DIR")]
    pub deploy_dir: Option<PathBuf>,

    /// URL of the default provisioning profile to avoid when possible
    #[arg(long, env = "BITRISE_DEFAULT_PROVISION_URL", value_name = "URL")]
    pub default_profile_url: Option<String>,

    /// Export with -exportFormat ipa and a named profile, skipping export options (yes/no)
    #[arg(long, env = "use_legacy_export", value_name = "BOOL", value_parser = parse_flag)]
    pub legacy_export: Option<bool>,

    /// Profile for the legacy export; the archive's embedded profile when omitted
    #[arg(long, env = "legacy_export_provisioning_profile_name", value_name = "NAME")]
    pub legacy_profile_name: Option<String>,

    /// Xcode major version; detected from `xcodebuild -version` when omitted
    #[arg(long, value_name = "MAJOR")]
    pub xcodebuild_version: Option<u32>,

    /// TOML file with default values for the options above
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Write the export options and stop before running xcodebuild
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging and detailed output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.xcodebuild_version == Some(0) {
            return Err("--xcodebuild-version must be a positive major version".to_string());
        }

        if let Some(settings) = &self.settings
            && !settings.is_file()
        {
            return Err(format!("Settings file not found: {}", settings.display()));
        }

        Ok(())
    }

    /// Layers the settings file (if any) and the explicit arguments.
    pub fn settings_builder(&self) -> crate::export::Result<SettingsBuilder> {
        let mut builder = match &self.settings {
            Some(path) => SettingsBuilder::with_file(SettingsFile::load(path)?),
            None => SettingsBuilder::new(),
        };

        if let Some(path) = &self.archive_path {
            builder = builder.archive_path(path);
        }
        if let Some(method) = self.distribution_method {
            builder = builder.distribution_method(method);
        }
        if let Some(product) = self.product {
            builder = builder.product(product);
        }
        if let Some(team_id) = &self.team_id {
            builder = builder.team_id(team_id);
        }
        if let Some(enabled) = self.upload_bitcode {
            builder = builder.upload_bitcode(enabled);
        }
        if let Some(enabled) = self.compile_bitcode {
            builder = builder.compile_bitcode(enabled);
        }
        if let Some(enabled) = self.manage_version_and_build_number {
            builder = builder.manage_version_and_build_number(enabled);
        }
        if let Some(content) = &self.export_options_plist_content {
            builder = builder.custom_export_options(content);
        }
        if let Some(dir) = &self.deploy_dir {
            builder = builder.deploy_dir(dir);
        }
        if let Some(url) = &self.default_profile_url {
            builder = builder.default_profile_url(url);
        }
        if let Some(enabled) = self.legacy_export {
            builder = builder.legacy_export(enabled);
        }
        if let Some(name) = &self.legacy_profile_name {
            builder = builder.legacy_profile_name(name);
        }
        if let Some(major) = self.xcodebuild_version {
            builder = builder.xcodebuild_major_version(major);
        }

        Ok(builder.dry_run(self.dry_run))
    }
}

/// Accepts the step's `yes`/`no` spelling as well as `true`/`false`.
fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        other => Err(format!("expected yes or no, got '{other}'")),
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

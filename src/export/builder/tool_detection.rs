//! `xcodebuild` detection and version lookup.

use crate::export::{Error, Result};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Location of `xcodebuild`, looked up once.
static XCODEBUILD: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("xcodebuild") {
    Ok(path) => {
        log::debug!("Found xcodebuild at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("xcodebuild not found in PATH: {}", e);
        None
    }
});

/// Path of `xcodebuild`.
///
/// # Errors
///
/// [`Error::Configuration`] when it is not on `PATH`.
pub fn find_xcodebuild() -> Result<PathBuf> {
    XCODEBUILD.clone().ok_or_else(|| {
        Error::Configuration(
            "xcodebuild not found in PATH; install Xcode or pass --xcodebuild-version".to_string(),
        )
    })
}

/// A parsed `xcodebuild -version` banner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XcodebuildVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<String>,
}

/// Parses output such as:
///
/// ```text
/// Xcode 15.2
/// Build version 15C500b
/// ```
pub fn parse_xcodebuild_version(output: &str) -> Option<XcodebuildVersion> {
    let mut version = None;
    let mut build = None;

    for line in output.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Xcode ") {
            let mut parts = rest.trim().split('.');
            let major = parts.next()?.parse().ok()?;
            let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
            version = Some((major, minor));
        } else if let Some(rest) = line.strip_prefix("Build version ") {
            build = Some(rest.trim().to_string());
        }
    }

    version.map(|(major, minor)| XcodebuildVersion {
        major,
        minor,
        build,
    })
}

/// Runs `xcodebuild -version` and returns the parsed version.
pub async fn detect_xcodebuild_version() -> Result<XcodebuildVersion> {
    let xcodebuild = find_xcodebuild()?;

    let output = tokio::process::Command::new(&xcodebuild)
        .arg("-version")
        .output()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to execute xcodebuild: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        return Err(Error::GenericError(format!(
            "xcodebuild -version failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    parse_xcodebuild_version(&stdout).ok_or_else(|| {
        Error::GenericError(format!("Unrecognized xcodebuild version output: {}", stdout.trim()))
    })
}

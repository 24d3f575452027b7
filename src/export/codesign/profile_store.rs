//! Provisioning profile store backed by the user's profile directories.

use super::profile::{ProfileKind, ProvisioningProfile};
use crate::export::{Error, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Source of installed provisioning profiles.
pub trait ProfileStore {
    /// Lists installed, unexpired profiles of the given platform kind.
    ///
    /// # Errors
    ///
    /// [`Error::StoreUnavailable`] when a profile directory exists but cannot be read.
    fn list_installed(&self, kind: ProfileKind) -> Result<Vec<ProvisioningProfile>>;
}

/// Reads `*.mobileprovision` files from the directories Xcode installs them to.
#[derive(Debug, Clone)]
pub struct InstalledProfileStore {
    directories: Vec<PathBuf>,
}

impl InstalledProfileStore {
    /// Uses the standard locations under the home directory:
    /// `~/Library/MobileDevice/Provisioning Profiles` and
    /// `~/Library/Developer/Xcode/UserData/Provisioning Profiles`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            Error::StoreUnavailable("cannot determine home directory".to_string())
        })?;
        let library = home.join("Library");

        Ok(Self::with_directories(vec![
            library.join("MobileDevice").join("Provisioning Profiles"),
            library
                .join("Developer")
                .join("Xcode")
                .join("UserData")
                .join("Provisioning Profiles"),
        ]))
    }

    /// Uses explicit directories, searched in order.
    pub fn with_directories(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    fn profile_paths(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        if !directory.exists() {
            log::debug!("Profile directory not found: {}", directory.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(directory).map_err(|e| {
            Error::StoreUnavailable(format!("failed to read {}: {}", directory.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::StoreUnavailable(format!(
                    "failed to read entry in {}: {}",
                    directory.display(),
                    e
                ))
            })?;
            let path = entry.path();
            let is_profile = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mobileprovision"));
            if is_profile {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths)
    }
}

impl ProfileStore for InstalledProfileStore {
    fn list_installed(&self, kind: ProfileKind) -> Result<Vec<ProvisioningProfile>> {
        let now = Utc::now();
        let mut profiles: Vec<ProvisioningProfile> = Vec::new();

        for directory in &self.directories {
            for path in self.profile_paths(directory)? {
                let bytes = std::fs::read(&path).map_err(|e| {
                    Error::StoreUnavailable(format!("failed to read {}: {}", path.display(), e))
                })?;

                let profile = match ProvisioningProfile::from_mobileprovision(&bytes) {
                    Ok(profile) => profile,
                    Err(e) => {
                        log::warn!("Skipping unreadable profile {}: {}", path.display(), e);
                        continue;
                    }
                };

                if profile.kind != kind {
                    continue;
                }
                if profile.is_expired_at(now) {
                    log::debug!("Skipping expired profile {} ({})", profile.name, profile.uuid);
                    continue;
                }
                // The same profile is often installed in both directories.
                if profiles.iter().any(|p| p.uuid == profile.uuid) {
                    continue;
                }
                profiles.push(profile);
            }
        }

        Ok(profiles)
    }
}

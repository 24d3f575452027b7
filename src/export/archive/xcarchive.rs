//! Filesystem reader for `.xcarchive` bundles.
//!
//! Layout consumed:
//!
//! ```text
//! MyApp.xcarchive/
//!   Info.plist                         ApplicationProperties.ApplicationPath
//!   Products/Applications/MyApp.app/
//!     Info.plist                       CFBundleIdentifier, DTPlatformName
//!     archived-expanded-entitlements.xcent
//!     embedded.mobileprovision
//!     PlugIns/*.appex
//!     Watch/*.app
//!     AppClips/*.app
//! ```

use super::{ArchiveReader, BundleTarget, OriginalSigningProfile};
use crate::export::codesign::{ProfileKind, ProvisioningProfile};
use crate::export::{Error, ErrorExt, ExportProduct, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const ENTITLEMENTS_FILE: &str = "archived-expanded-entitlements.xcent";
const EMBEDDED_PROFILE_FILE: &str = "embedded.mobileprovision";

/// One `.app` or `.appex` bundle and the bundles nested inside it.
#[derive(Clone, Debug)]
struct AppBundle {
    path: PathBuf,
    bundle_id: String,
    platform_name: Option<String>,
    /// `None` when the bundle carries no entitlements document.
    entitlements: Option<BTreeSet<String>>,
    embedded_profile: Option<ProvisioningProfile>,
    plugins: Vec<AppBundle>,
    watch_apps: Vec<AppBundle>,
    clips: Vec<AppBundle>,
}

impl AppBundle {
    fn open(path: &Path) -> Result<Self> {
        let info_path = path.join("Info.plist");
        if !info_path.exists() {
            return Err(Error::ArchiveMalformed(format!(
                "bundle has no Info.plist: {}",
                path.display()
            )));
        }
        let info = plist::Value::from_file(&info_path)?;
        let info = info.as_dictionary().ok_or_else(|| {
            Error::ArchiveMalformed(format!("{} is not a dictionary", info_path.display()))
        })?;

        let bundle_id = info
            .get("CFBundleIdentifier")
            .and_then(plist::Value::as_string)
            .ok_or_else(|| {
                Error::ArchiveMalformed(format!(
                    "no CFBundleIdentifier in {}",
                    info_path.display()
                ))
            })?
            .to_string();
        let platform_name = info
            .get("DTPlatformName")
            .and_then(plist::Value::as_string)
            .map(String::from);

        let entitlements_path = path.join(ENTITLEMENTS_FILE);
        let entitlements = if entitlements_path.exists() {
            let value = plist::Value::from_file(&entitlements_path)?;
            let keys = value
                .as_dictionary()
                .map(|dict| dict.keys().cloned().collect())
                .unwrap_or_default();
            Some(keys)
        } else {
            None
        };

        let profile_path = path.join(EMBEDDED_PROFILE_FILE);
        let embedded_profile = if profile_path.exists() {
            let bytes =
                std::fs::read(&profile_path).fs_context("reading embedded profile", &profile_path)?;
            Some(ProvisioningProfile::from_mobileprovision(&bytes)?)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            bundle_id,
            platform_name,
            entitlements,
            embedded_profile,
            plugins: open_children(&path.join("PlugIns"), "appex")?,
            watch_apps: open_children(&path.join("Watch"), "app")?,
            clips: open_children(&path.join("AppClips"), "app")?,
        })
    }

    /// Nested bundles depth-first: extensions, watch apps, then clips.
    fn nested(&self, include_clips: bool) -> Vec<&AppBundle> {
        let mut bundles = Vec::new();
        for plugin in &self.plugins {
            bundles.push(plugin);
            bundles.extend(plugin.nested(false));
        }
        for watch_app in &self.watch_apps {
            bundles.push(watch_app);
            bundles.extend(watch_app.nested(false));
        }
        if include_clips {
            for clip in &self.clips {
                bundles.push(clip);
                bundles.extend(clip.nested(false));
            }
        }
        bundles
    }

    fn target(&self) -> BundleTarget {
        BundleTarget {
            bundle_id: self.bundle_id.clone(),
            entitlement_keys: self.entitlements.clone().unwrap_or_default(),
        }
    }
}

fn open_children(directory: &Path, extension: &str) -> Result<Vec<AppBundle>> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
        .fs_context("reading bundle directory", directory)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    paths.sort();

    paths.iter().map(|path| AppBundle::open(path)).collect()
}

/// An `.xcarchive` read from disk.
#[derive(Clone, Debug)]
pub struct XcArchive {
    path: PathBuf,
    application: AppBundle,
}

impl XcArchive {
    /// Reads the archive's metadata eagerly.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveMalformed`] when no application can be found or a
    /// bundle lacks its identifier.
    pub fn open(path: &Path) -> Result<Self> {
        let application_path = locate_application(path)?;
        log::debug!("Archived application: {}", application_path.display());

        Ok(Self {
            path: path.to_path_buf(),
            application: AppBundle::open(&application_path)?,
        })
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the archived main application.
    pub fn application_path(&self) -> &Path {
        &self.application.path
    }
}

fn locate_application(archive: &Path) -> Result<PathBuf> {
    let products = archive.join("Products");

    let info_path = archive.join("Info.plist");
    if info_path.exists() {
        let info = plist::Value::from_file(&info_path)?;
        let declared = info
            .as_dictionary()
            .and_then(|d| d.get("ApplicationProperties"))
            .and_then(plist::Value::as_dictionary)
            .and_then(|d| d.get("ApplicationPath"))
            .and_then(plist::Value::as_string);
        if let Some(relative) = declared {
            let candidate = products.join(relative);
            if candidate.is_dir() {
                return Ok(candidate);
            }
            log::warn!(
                "ApplicationPath {} does not exist, scanning Products/Applications",
                candidate.display()
            );
        }
    }

    let applications = products.join("Applications");
    open_dir_sorted(&applications)?
        .into_iter()
        .find(|path| path.extension().and_then(|e| e.to_str()) == Some("app"))
        .ok_or_else(|| {
            Error::ArchiveMalformed(format!(
                "no application found in {}",
                applications.display()
            ))
        })
}

fn open_dir_sorted(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(Error::ArchiveMalformed(format!(
            "missing directory {}",
            directory.display()
        )));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
        .fs_context("reading archive directory", directory)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();
    Ok(paths)
}

impl ArchiveReader for XcArchive {
    fn bundle_targets(&self, product: ExportProduct) -> Result<Vec<BundleTarget>> {
        let (primary, nested) = match product {
            ExportProduct::App => (&self.application, self.application.nested(true)),
            ExportProduct::AppClip => {
                let clip = self.application.clips.first().ok_or_else(|| {
                    Error::ArchiveMalformed(format!(
                        "app-clip export requested but {} contains no App Clip",
                        self.application.bundle_id
                    ))
                })?;
                (clip, clip.nested(false))
            }
        };

        let mut targets = vec![primary.target()];
        for bundle in nested {
            if bundle.entitlements.is_none() {
                log::debug!("{} declares no entitlements, not a signing target", bundle.bundle_id);
                continue;
            }
            if targets.iter().any(|t| t.bundle_id == bundle.bundle_id) {
                continue;
            }
            targets.push(bundle.target());
        }

        Ok(targets)
    }

    fn original_signing_profile(&self, product: ExportProduct) -> Result<OriginalSigningProfile> {
        let clip_profile = match product {
            ExportProduct::App => None,
            ExportProduct::AppClip => self
                .application
                .clips
                .first()
                .and_then(|clip| clip.embedded_profile.as_ref()),
        };
        let profile = clip_profile.or(self.application.embedded_profile.as_ref());
        let profile = profile.ok_or_else(|| {
            Error::ArchiveMalformed(format!(
                "{} has no {}",
                self.application.path.display(),
                EMBEDDED_PROFILE_FILE
            ))
        })?;

        Ok(OriginalSigningProfile {
            name: profile.name.clone(),
            managed: profile.managed,
            export_method: profile.export_method,
        })
    }

    fn profile_kind(&self) -> ProfileKind {
        self.application
            .platform_name
            .as_deref()
            .map(ProfileKind::from_platform_name)
            .unwrap_or_default()
    }
}

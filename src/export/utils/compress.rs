//! Directory zipping for dSYMs and distribution logs.

use crate::bail;
use crate::export::error::{Error, ErrorExt, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Zips `source` into `destination`, keeping the directory itself as the
/// archive's top-level entry.
///
/// Runs on the blocking thread pool.
pub async fn zip_dir(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("{source:?} is not a directory");
    }

    let source = source.to_path_buf();
    let destination = destination.to_path_buf();

    tokio::task::spawn_blocking(move || zip_dir_blocking(&source, &destination))
        .await
        .map_err(|e| Error::GenericError(format!("Zip task panicked: {}", e)))?
}

fn zip_dir_blocking(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
    }

    let file = std::fs::File::create(destination).fs_context("creating zip file", destination)?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let base: PathBuf = source.parent().unwrap_or(source).to_path_buf();

    let mut entries: Vec<walkdir::DirEntry> = walkdir::WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::GenericError(format!("Failed to walk {}: {}", source.display(), e)))?;
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        let relative = entry
            .path()
            .strip_prefix(&base)
            .map_err(|e| Error::GenericError(format!("Invalid zip entry path: {}", e)))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let content =
                std::fs::read(entry.path()).fs_context("reading file for zip", entry.path())?;
            zip.write_all(&content)?;
        }
    }

    zip.finish()?;
    Ok(())
}

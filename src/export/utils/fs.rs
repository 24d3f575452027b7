//! File system utilities for export runs.

use crate::bail;
use crate::export::error::{Error, ErrorExt, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing directory".to_string(),
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Copies a regular file, creating the destination's parent directories.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_file() {
        bail!("{from:?} is not a file");
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Writes `content` to `path`, creating parent directories.
pub async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }
    fs::write(path, content).await.fs_context("writing file", path)
}

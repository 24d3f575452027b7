//! HTTP utilities.

use crate::export::error::{Error, Result};

/// Downloads a file from a URL.
///
/// Returns the file contents as a byte vector. Non-success status codes are
/// errors. No retry is attempted.
///
/// Used by:
/// - default provisioning profile lookup
pub async fn download(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = reqwest::get(url).await?.error_for_status()?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to read response: {}", e)))?;

    Ok(bytes.to_vec())
}

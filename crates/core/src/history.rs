//! Local history file: the newest gallery images persisted to disk.
//!
//! Serves as a fallback history view when the remote store is unavailable,
//! and restores the gallery across restarts.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::image::ImageDescriptor;

/// Maximum number of descriptors kept in the history file.
pub const HISTORY_LIMIT: usize = 50;

/// The first [`HISTORY_LIMIT`] images.
pub fn bounded(images: &[ImageDescriptor]) -> &[ImageDescriptor] {
    &images[..images.len().min(HISTORY_LIMIT)]
}

/// Outcome of reading the history file.
#[derive(Debug)]
pub enum LoadedHistory {
    /// The file was absent or parsed cleanly.
    Images(Vec<ImageDescriptor>),
    /// The file exists but is not a valid image list.
    Corrupt(String),
}

/// Load the history file. A missing file is an empty history.
pub async fn load(path: &Path) -> Result<LoadedHistory, CoreError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadedHistory::Images(Vec::new())),
        Err(e) => {
            return Err(CoreError::Internal(format!(
                "Failed to read history file {}: {e}",
                path.display()
            )))
        }
    };

    match serde_json::from_slice::<Vec<ImageDescriptor>>(&raw) {
        Ok(mut images) => {
            images.truncate(HISTORY_LIMIT);
            Ok(LoadedHistory::Images(images))
        }
        Err(e) => Ok(LoadedHistory::Corrupt(e.to_string())),
    }
}

/// Move an unreadable history file aside as `<name>.corrupt` so the next
/// save starts from a clean slate. Returns the new location.
pub async fn quarantine(path: &Path) -> Result<PathBuf, CoreError> {
    let target = sibling(path, "corrupt");
    tokio::fs::rename(path, &target).await.map_err(|e| {
        CoreError::Internal(format!(
            "Failed to move history file {} aside: {e}",
            path.display()
        ))
    })?;
    Ok(target)
}

/// Write the newest [`HISTORY_LIMIT`] images, creating parent directories
/// as needed.
///
/// The list is written to a temporary sibling and renamed over `path`, so a
/// reader never sees a half-written file.
pub async fn save(path: &Path, images: &[ImageDescriptor]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create history dir: {e}")))?;
    }

    let json = serde_json::to_vec_pretty(bounded(images))
        .map_err(|e| CoreError::Internal(format!("Failed to encode history: {e}")))?;

    let tmp = sibling(path, "tmp");
    tokio::fs::write(&tmp, json).await.map_err(|e| {
        CoreError::Internal(format!(
            "Failed to write history file {}: {e}",
            tmp.display()
        ))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        CoreError::Internal(format!(
            "Failed to replace history file {}: {e}",
            path.display()
        ))
    })
}

/// `path` with `.suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

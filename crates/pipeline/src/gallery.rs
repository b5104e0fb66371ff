//! The gallery shared between request handlers and poll tasks.
//!
//! Every mutation that changes the image list is followed by a best-effort
//! write of the history file. Selection changes are not persisted.

use std::path::PathBuf;

use spijker_core::error::CoreError;
use spijker_core::gallery::{Gallery, GallerySnapshot};
use spijker_core::history::{self, LoadedHistory};
use spijker_core::image::ImageDescriptor;
use tokio::sync::{Mutex, RwLock};

pub struct SharedGallery {
    inner: RwLock<Gallery>,
    history_path: Option<PathBuf>,
    /// Held from snapshot to rename so history writes land in mutation order.
    persist_lock: Mutex<()>,
}

impl SharedGallery {
    /// An in-memory gallery that is never written to disk.
    pub fn in_memory(gallery: Gallery) -> Self {
        Self {
            inner: RwLock::new(gallery),
            history_path: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Restore the gallery from the history file at `path` and keep
    /// writing it back there.
    ///
    /// An unreadable file never blocks startup: a corrupt one is moved aside
    /// and the gallery starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let images = match history::load(&path).await {
            Ok(LoadedHistory::Images(images)) => images,
            Ok(LoadedHistory::Corrupt(reason)) => {
                tracing::warn!(path = %path.display(), %reason, "Gallery history is corrupt, starting empty");
                match history::quarantine(&path).await {
                    Ok(moved) => {
                        tracing::info!(moved_to = %moved.display(), "Moved corrupt gallery history aside")
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to move corrupt gallery history aside"),
                }
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read gallery history, starting empty");
                Vec::new()
            }
        };
        tracing::info!(path = %path.display(), count = images.len(), "Loaded gallery history");
        Self {
            inner: RwLock::new(Gallery::new(images)),
            history_path: Some(path),
            persist_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> GallerySnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// The `n` newest images.
    pub async fn recent(&self, n: usize) -> Vec<ImageDescriptor> {
        self.inner.read().await.recent(n).to_vec()
    }

    /// The newest history-sized slice of images.
    pub async fn history(&self) -> Vec<ImageDescriptor> {
        history::bounded(self.inner.read().await.images()).to_vec()
    }

    pub async fn toggle_select(&self, id: &str) -> Result<bool, CoreError> {
        self.inner.write().await.toggle_select(id)
    }

    pub async fn toggle_select_all(&self) -> GallerySnapshot {
        let mut gallery = self.inner.write().await;
        gallery.toggle_select_all();
        gallery.snapshot()
    }

    pub async fn clear_selection(&self) {
        self.inner.write().await.clear_selection();
    }

    /// Remove `ids` (or the current selection when `ids` is empty) and hand
    /// the removed descriptors to `on_removed`.
    pub async fn delete_with<F>(&self, ids: &[String], on_removed: F) -> Vec<ImageDescriptor>
    where
        F: FnOnce(&[ImageDescriptor]),
    {
        let _persist = self.persist_lock.lock().await;
        let (removed, images) = {
            let mut gallery = self.inner.write().await;
            let ids = if ids.is_empty() {
                gallery.selected_ids()
            } else {
                ids.to_vec()
            };
            let removed = gallery.delete_with(&ids, on_removed);
            (removed, gallery.images().to_vec())
        };
        if !removed.is_empty() {
            self.persist(&images).await;
        }
        removed
    }

    /// Swap in the latest listing for one folder.
    pub async fn replace_folder_images(&self, folder_id: &str, images: Vec<ImageDescriptor>) {
        let _persist = self.persist_lock.lock().await;
        let snapshot = {
            let mut gallery = self.inner.write().await;
            gallery.replace_folder_images(folder_id, images);
            gallery.images().to_vec()
        };
        self.persist(&snapshot).await;
    }

    /// Callers hold `persist_lock`.
    async fn persist(&self, images: &[ImageDescriptor]) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Err(e) = history::save(path, images).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save gallery history");
        }
    }
}

impl Default for SharedGallery {
    fn default() -> Self {
        Self::in_memory(Gallery::default())
    }
}

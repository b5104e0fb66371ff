//! In-memory gallery of generated images with multi-select.
//!
//! Deleting from the gallery only removes descriptors from this list. The
//! remote session row and the files on the external host are left as they
//! are; callers that need to react (persist the history file, notify
//! clients) pass a removal callback to [`Gallery::delete_with`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::history::HISTORY_LIMIT;
use crate::image::ImageDescriptor;

/// Number of images shown on the dashboard home view.
pub const RECENT_IMAGES_COUNT: usize = 5;

/// Image list plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    /// Newest first.
    images: Vec<ImageDescriptor>,
    selected: BTreeSet<String>,
}

/// Serializable view of the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct GallerySnapshot {
    pub images: Vec<ImageDescriptor>,
    pub selected: Vec<String>,
    pub all_selected: bool,
}

impl Gallery {
    pub fn new(images: Vec<ImageDescriptor>) -> Self {
        Self {
            images,
            selected: BTreeSet::new(),
        }
    }

    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The `n` newest images.
    pub fn recent(&self, n: usize) -> &[ImageDescriptor] {
        &self.images[..n.min(self.images.len())]
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// True when every image is selected (vacuously true for an empty
    /// gallery, matching the "Deselect All" label logic).
    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.images.len()
    }

    /// Toggle one image. Returns whether it is selected afterwards.
    pub fn toggle_select(&mut self, id: &str) -> Result<bool, CoreError> {
        if !self.images.iter().any(|img| img.id == id) {
            return Err(CoreError::NotFound {
                entity: "Image",
                id: id.to_string(),
            });
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }

    /// Select everything, or clear the selection when everything is
    /// already selected.
    pub fn toggle_select_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.images.iter().map(|img| img.id.clone()).collect();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Remove exactly the given ids from the gallery and the selection.
    ///
    /// Unknown ids are ignored. Returns the removed descriptors in gallery
    /// order.
    pub fn delete(&mut self, ids: &[String]) -> Vec<ImageDescriptor> {
        let targets: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.images)
            .into_iter()
            .partition(|img| targets.contains(img.id.as_str()));
        self.images = kept;
        for img in &removed {
            self.selected.remove(&img.id);
        }
        removed
    }

    /// [`delete`](Self::delete), then hand the removed descriptors to
    /// `on_removed` when anything was actually removed.
    pub fn delete_with<F>(&mut self, ids: &[String], on_removed: F) -> Vec<ImageDescriptor>
    where
        F: FnOnce(&[ImageDescriptor]),
    {
        let removed = self.delete(ids);
        if !removed.is_empty() {
            on_removed(&removed);
        }
        removed
    }

    /// Delete whatever is currently selected.
    pub fn delete_selected(&mut self) -> Vec<ImageDescriptor> {
        let ids = self.selected_ids();
        self.delete(&ids)
    }

    /// Replace every image belonging to `folder_id` with `images`.
    ///
    /// Each poll tick lists the full folder, so the previous images of that
    /// folder are dropped wholesale and the new listing goes to the front.
    /// Images from other folders are untouched. The list is capped at
    /// [`HISTORY_LIMIT`], the same bound the history file keeps, and
    /// selection entries for images that disappeared are pruned.
    pub fn replace_folder_images(&mut self, folder_id: &str, images: Vec<ImageDescriptor>) {
        self.images
            .retain(|img| img.folder_id.as_deref() != Some(folder_id));
        let mut merged = images;
        merged.append(&mut self.images);
        merged.truncate(HISTORY_LIMIT);
        self.images = merged;

        let present: BTreeSet<&str> = self.images.iter().map(|img| img.id.as_str()).collect();
        self.selected.retain(|id| present.contains(id.as_str()));
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        GallerySnapshot {
            images: self.images.clone(),
            selected: self.selected_ids(),
            all_selected: !self.images.is_empty() && self.all_selected(),
        }
    }
}

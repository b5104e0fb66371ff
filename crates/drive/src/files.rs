//! Wire types of the file-listing response.

use serde::Deserialize;
use spijker_core::image::{is_image_mime, ImageDescriptor};

/// Direct-view URL used when a file carries no thumbnail link.
const VIEW_URL_BASE: &str = "https://drive.google.com/uc?export=view&id=";

/// Fields requested from the listing endpoint.
pub const LISTING_FIELDS: &str = "files(id,name,mimeType,thumbnailLink,webContentLink,webViewLink)";

/// Body of `GET /drive/v3/files`.
#[derive(Debug, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// One child of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    #[serde(default)]
    pub web_content_link: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

impl DriveFile {
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }

    /// URL the gallery renders: the thumbnail when the host provides one,
    /// otherwise the direct-view link.
    pub fn display_url(&self) -> String {
        match &self.thumbnail_link {
            Some(link) if !link.is_empty() => link.clone(),
            _ => format!("{VIEW_URL_BASE}{}", self.id),
        }
    }

    /// Convert into a gallery descriptor stamped with the run's folder,
    /// prompt, and observation time.
    pub fn into_descriptor(self, folder_id: &str, prompt: &str, timestamp: i64) -> ImageDescriptor {
        let url = self.display_url();
        let drive_url = self.web_view_link.or(self.web_content_link);
        ImageDescriptor {
            id: self.id,
            url,
            name: self.name,
            drive_url,
            folder_id: Some(folder_id.to_string()),
            timestamp,
            prompt: prompt.to_string(),
        }
    }
}

//! Image descriptors produced by a generation run.

use serde::{Deserialize, Serialize};

/// MIME prefix that marks a listed file as an image.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Prompt recorded on images when the submission had no description.
pub const DEFAULT_PROMPT: &str = "Generated Image";

/// One generated image, as shown in the gallery and stored in the
/// session row's `images` column.
///
/// Created when the poller first observes the external file and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// External file id.
    pub id: String,
    /// URL suitable for display (thumbnail or direct content link).
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Direct link to the file in the external host's viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Capture time in epoch milliseconds.
    pub timestamp: i64,
    pub prompt: String,
}

/// Whether a MIME type denotes an image file.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with(IMAGE_MIME_PREFIX)
}

/// The prompt to stamp on generated images for a given description.
pub fn prompt_or_default(description: Option<&str>) -> String {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_PROMPT)
        .to_string()
}

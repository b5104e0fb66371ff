//! REST client for the file-listing endpoint.

use std::time::Duration;

use spijker_core::image::{prompt_or_default, ImageDescriptor};

use crate::files::{DriveFile, FileList, LISTING_FIELDS};

/// Public API host.
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com";

/// Timeout for a single listing request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`DriveApi`].
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Base URL, e.g. `https://www.googleapis.com`.
    pub api_url: String,
    /// Raw key as configured; validated on every listing call.
    pub api_key: Option<String>,
}

impl DriveConfig {
    /// Load from `DRIVE_API_URL` and `GOOGLE_DRIVE_API_KEY`.
    ///
    /// A missing key is not an error here; it surfaces as
    /// [`DriveApiError::MissingApiKey`] when polling starts.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("DRIVE_API_URL")
                .unwrap_or_else(|_| DEFAULT_DRIVE_API_URL.to_string()),
            api_key: std::env::var("GOOGLE_DRIVE_API_KEY").ok(),
        }
    }
}

/// Errors from the listing API.
#[derive(Debug, thiserror::Error)]
pub enum DriveApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 403: the key is invalid or the folder is not shared publicly.
    #[error("Permission denied listing folder. Check the API key and that the folder is shared")]
    PermissionDenied,

    /// 404: the folder does not exist.
    #[error("Folder not found: {folder_id}")]
    FolderNotFound { folder_id: String },

    /// Any other non-2xx status.
    #[error("Drive API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// No usable key is configured.
    #[error("Google Drive API key is not configured. Set GOOGLE_DRIVE_API_KEY")]
    MissingApiKey,
}

impl DriveApiError {
    /// Errors that will not go away by asking again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::FolderNotFound { .. } | Self::MissingApiKey
        )
    }
}

/// Reject unset, empty, and template placeholder keys.
pub fn validate_api_key(key: Option<&str>) -> Result<&str, DriveApiError> {
    let key = key.map(str::trim).unwrap_or_default();
    let placeholder = matches!(
        key,
        "YOUR_API_KEY" | "your-api-key" | "your_google_drive_api_key"
    ) || key.starts_with("your")
        || key.starts_with("YOUR");
    if key.is_empty() || placeholder {
        return Err(DriveApiError::MissingApiKey);
    }
    Ok(key)
}

/// HTTP client for the listing API.
#[derive(Debug, Clone)]
pub struct DriveApi {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl DriveApi {
    pub fn new(config: &DriveConfig) -> Result<Self, DriveApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &DriveConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Whether a usable key is configured.
    pub fn has_api_key(&self) -> bool {
        validate_api_key(self.api_key.as_deref()).is_ok()
    }

    /// List the non-trashed children of `folder_id`.
    pub async fn list_folder_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveApiError> {
        let key = validate_api_key(self.api_key.as_deref())?;
        let query = children_query(folder_id);

        let response = self
            .client
            .get(format!("{}/drive/v3/files", self.api_url))
            .query(&[("q", query.as_str()), ("fields", LISTING_FIELDS), ("key", key)])
            .send()
            .await?;

        let list: FileList = Self::parse_response(response, folder_id).await?;
        Ok(list.files)
    }

    /// List the image children of `folder_id` as gallery descriptors.
    pub async fn list_folder_images(
        &self,
        folder_id: &str,
        description: Option<&str>,
    ) -> Result<Vec<ImageDescriptor>, DriveApiError> {
        let prompt = prompt_or_default(description);
        let now = chrono::Utc::now().timestamp_millis();
        let images: Vec<_> = self
            .list_folder_files(folder_id)
            .await?
            .into_iter()
            .filter(DriveFile::is_image)
            .map(|f| f.into_descriptor(folder_id, &prompt, now))
            .collect();
        tracing::debug!(folder_id, count = images.len(), "Listed folder images");
        Ok(images)
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
        folder_id: &str,
    ) -> Result<reqwest::Response, DriveApiError> {
        let status = response.status();
        match status.as_u16() {
            _ if status.is_success() => Ok(response),
            403 => Err(DriveApiError::PermissionDenied),
            404 => Err(DriveApiError::FolderNotFound {
                folder_id: folder_id.to_string(),
            }),
            code => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                Err(DriveApiError::ApiError { status: code, body })
            }
        }
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        folder_id: &str,
    ) -> Result<T, DriveApiError> {
        let response = Self::ensure_success(response, folder_id).await?;
        Ok(response.json::<T>().await?)
    }
}

/// The `q` expression selecting the live children of `folder_id`. Quotes
/// and backslashes in the id are escaped so it stays a single string literal.
fn children_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and trashed=false")
}

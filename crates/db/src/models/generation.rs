//! Generation session entity model and DTOs.

use serde::{Deserialize, Deserializer, Serialize};
use spijker_core::image::ImageDescriptor;
use spijker_core::session::SessionStatus;
use spijker_core::types::{SessionId, Timestamp};

/// A row from the `image_generations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSession {
    /// Store-assigned row id.
    pub id: String,
    /// Logical session id; every filter and patch targets this column.
    pub session_id: SessionId,
    #[serde(default)]
    pub session_name: Option<String>,
    pub folder_id: String,
    #[serde(default)]
    pub folder_url: Option<String>,
    #[serde(default)]
    pub reference_image_url: Option<String>,
    #[serde(default)]
    pub reference_image_key: Option<String>,
    pub total_images: i32,
    pub generated_count: i32,
    pub status: SessionStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// DTO for inserting a new session row.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGeneration {
    pub session_id: SessionId,
    pub session_name: Option<String>,
    pub folder_id: String,
    pub folder_url: Option<String>,
    pub reference_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image_key: Option<String>,
    pub total_images: i32,
    pub generated_count: i32,
    pub status: SessionStatus,
    pub images: Vec<ImageDescriptor>,
}

impl CreateGeneration {
    /// A fresh `processing` row with no images yet.
    pub fn processing(
        session_id: SessionId,
        session_name: String,
        folder_id: String,
        folder_url: Option<String>,
        total_images: u32,
    ) -> Self {
        Self {
            session_id,
            session_name: Some(session_name),
            folder_id,
            folder_url,
            reference_image_url: None,
            reference_image_key: None,
            total_images: to_i32(total_images),
            generated_count: 0,
            status: SessionStatus::Processing,
            images: Vec::new(),
        }
    }
}

/// DTO for patching a session row. All fields are optional and omitted
/// from the body when `None`.
///
/// There is deliberately no `session_id` field: the identifier selects the
/// row and is never part of the patch body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateGeneration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl UpdateGeneration {
    /// Patch carrying a new image listing.
    pub fn images(images: Vec<ImageDescriptor>) -> Self {
        Self {
            generated_count: Some(to_i32(images.len() as u32)),
            images: Some(images),
            ..Default::default()
        }
    }

    /// Also set a terminal status (and completion time for `completed`).
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        if status == SessionStatus::Completed {
            self.completed_at = Some(chrono::Utc::now());
        }
        self.status = Some(status);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Patch that only moves the row to a terminal status.
    pub fn status(status: SessionStatus) -> Self {
        Self::default().with_status(status)
    }
}

fn to_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ImageDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ImageDescriptor>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_json() -> serde_json::Value {
        serde_json::json!({
            "id": "8b0c2c7e-0000-0000-0000-000000000001",
            "session_id": "0190f5a4-7c1e-7000-8000-000000000001",
            "session_name": "Spring set",
            "folder_id": "F1",
            "folder_url": "https://drive.google.com/drive/folders/F1",
            "reference_image_url": null,
            "reference_image_key": null,
            "total_images": 8,
            "generated_count": 0,
            "status": "processing",
            "images": null,
            "error_message": null,
            "created_at": "2025-03-01T09:30:00+00:00",
            "updated_at": "2025-03-01T09:30:00+00:00",
            "completed_at": null
        })
    }

    #[test]
    fn row_with_null_images_decodes_to_empty_list() {
        let row: GenerationSession = serde_json::from_value(row_json()).unwrap();
        assert!(row.images.is_empty());
        assert_eq!(row.status, SessionStatus::Processing);
        assert_eq!(row.session_name.as_deref(), Some("Spring set"));
    }

    #[test]
    fn update_body_never_contains_session_id() {
        let patch = UpdateGeneration::images(Vec::new()).with_status(SessionStatus::Completed);
        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("session_id").is_none());
        assert_eq!(json["status"], "completed");
        assert_eq!(json["generated_count"], 0);
        assert!(json.get("completed_at").is_some());
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let json = serde_json::to_value(UpdateGeneration::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn failed_status_does_not_set_completed_at() {
        let patch = UpdateGeneration::status(SessionStatus::Failed).with_error("boom");
        assert!(patch.completed_at.is_none());
        assert_eq!(patch.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn create_processing_starts_empty() {
        let create = CreateGeneration::processing(
            uuid::Uuid::nil(),
            "n".into(),
            "F1".into(),
            None,
            8,
        );
        assert_eq!(create.status, SessionStatus::Processing);
        assert_eq!(create.generated_count, 0);
        assert_eq!(create.total_images, 8);
        let json = serde_json::to_value(&create).unwrap();
        assert!(json.get("reference_image_key").is_none());
    }
}

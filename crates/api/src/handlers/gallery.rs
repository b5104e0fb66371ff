//! Handlers for the in-memory image gallery.
//!
//! Deleting images only affects this service's gallery and its history
//! file. Session rows in the store and files in the Drive folder are left
//! as they are.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use spijker_core::gallery::GallerySnapshot;
use spijker_events::{event_types, GenerationEvent};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleSelection {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionChanged {
    pub id: String,
    pub selected: bool,
}

/// Body for the delete endpoint. An empty or missing `ids` list deletes
/// the current selection.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteImages {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: Vec<String>,
    pub remaining: usize,
}

/// GET /api/v1/gallery
pub async fn get_gallery(State(state): State<AppState>) -> Json<DataResponse<GallerySnapshot>> {
    Json(DataResponse {
        data: state.gallery.snapshot().await,
    })
}

/// POST /api/v1/gallery/selection/toggle
pub async fn toggle_selection(
    State(state): State<AppState>,
    Json(input): Json<ToggleSelection>,
) -> AppResult<Json<DataResponse<SelectionChanged>>> {
    let selected = state.gallery.toggle_select(&input.id).await?;
    Ok(Json(DataResponse {
        data: SelectionChanged {
            id: input.id,
            selected,
        },
    }))
}

/// POST /api/v1/gallery/selection/all
///
/// Selects every image, or clears the selection when all are selected.
pub async fn toggle_select_all(
    State(state): State<AppState>,
) -> Json<DataResponse<GallerySnapshot>> {
    Json(DataResponse {
        data: state.gallery.toggle_select_all().await,
    })
}

/// DELETE /api/v1/gallery/selection
pub async fn clear_selection(State(state): State<AppState>) -> StatusCode {
    state.gallery.clear_selection().await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/gallery/delete
pub async fn delete_images(
    State(state): State<AppState>,
    Json(input): Json<DeleteImages>,
) -> Json<DataResponse<DeleteResult>> {
    let bus = &state.event_bus;
    let removed = state
        .gallery
        .delete_with(&input.ids, |removed| {
            let ids: Vec<&str> = removed.iter().map(|img| img.id.as_str()).collect();
            let count = ids.len();
            bus.publish(
                GenerationEvent::new(event_types::GALLERY_IMAGES_DELETED)
                    .with_payload(json!({ "ids": ids, "count": count })),
            );
        })
        .await;

    let deleted: Vec<String> = removed.into_iter().map(|img| img.id).collect();
    tracing::info!(count = deleted.len(), "Gallery images deleted");

    Json(DataResponse {
        data: DeleteResult {
            deleted,
            remaining: state.gallery.len().await,
        },
    })
}

//! Handlers for submitting, watching, and cancelling generation runs.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use spijker_core::phase::GenerationProgress;
use spijker_core::submission::{Attachment, GenerationRequest};
use spijker_core::types::SessionId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Content type assumed when the browser sends none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Returned when a generation has been accepted.
#[derive(Debug, Serialize)]
pub struct GenerationAccepted {
    pub session_id: SessionId,
    pub progress: ProgressView,
}

/// Progress plus the derived completion percentage.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    #[serde(flatten)]
    pub progress: GenerationProgress,
    pub percent: u8,
}

impl From<GenerationProgress> for ProgressView {
    fn from(progress: GenerationProgress) -> Self {
        let percent = progress.percent();
        Self { progress, percent }
    }
}

/// POST /api/v1/generations
///
/// Accepts a multipart form with optional `image`, `pdf`, `name`, and
/// `description` fields. At least an image or a description is required.
/// The webhook call runs in the background; poll progress or listen on the
/// WebSocket for the outcome.
pub async fn create_generation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<GenerationAccepted>>)> {
    let mut request = GenerationRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => request.image = read_attachment(field, "image").await?,
            "pdf" => request.document = read_attachment(field, "instructions.pdf").await?,
            "name" => request.name = Some(read_text(field).await?),
            "description" => request.description = Some(read_text(field).await?),
            _ => {}
        }
    }

    let session_id = state.generations.start(request).await?;
    tracing::info!(session_id = %session_id, "Generation accepted");

    let progress = state.generations.progress().await.into();
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: GenerationAccepted {
                session_id,
                progress,
            },
        }),
    ))
}

/// GET /api/v1/generations/progress
pub async fn get_progress(State(state): State<AppState>) -> Json<DataResponse<ProgressView>> {
    Json(DataResponse {
        data: state.generations.progress().await.into(),
    })
}

/// POST /api/v1/generations/cancel
///
/// Cancels the running generation. Returns 409 when nothing is running.
pub async fn cancel_generation(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ProgressView>>> {
    let session_id = state.generations.cancel_active().await?;
    tracing::info!(session_id = %session_id, "Generation cancelled by user");

    Ok(Json(DataResponse {
        data: state.generations.progress().await.into(),
    }))
}

/// Read a file part. Browsers send an empty part for an untouched file
/// input, which counts as no attachment.
async fn read_attachment(
    field: Field<'_>,
    default_name: &str,
) -> AppResult<Option<Attachment>> {
    let file_name = field.file_name().unwrap_or(default_name).to_string();
    let content_type = field
        .content_type()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(Attachment::new(file_name, content_type, data.to_vec())))
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

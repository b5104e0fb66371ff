//! Handlers for the session store records.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use spijker_core::error::CoreError;
use spijker_core::session::clamp_list_limit;
use spijker_core::types::SessionId;
use spijker_db::models::generation::GenerationSession;
use spijker_db::repositories::GenerationRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSessionsParams {
    pub limit: Option<u32>,
}

/// GET /api/v1/sessions?limit=N
///
/// Newest sessions first. `limit` defaults to the configured page size and
/// is clamped to the store maximum.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<ListSessionsParams>,
) -> AppResult<Json<DataResponse<Vec<GenerationSession>>>> {
    let limit = clamp_list_limit(params.limit.or(Some(state.config.session_list_limit)));
    let sessions = GenerationRepo::list_recent(&state.store, limit).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<Json<DataResponse<GenerationSession>>> {
    let session = find_session(&state, session_id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// DELETE /api/v1/sessions/{session_id}
///
/// Removes the store row only. Images already in the gallery stay.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> AppResult<StatusCode> {
    find_session(&state, session_id).await?;
    GenerationRepo::delete(&state.store, session_id).await?;
    tracing::info!(session_id = %session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_session(state: &AppState, session_id: SessionId) -> AppResult<GenerationSession> {
    GenerationRepo::find_by_session_id(&state.store, session_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "GenerationSession",
                id: session_id.to_string(),
            }
            .into()
        })
}

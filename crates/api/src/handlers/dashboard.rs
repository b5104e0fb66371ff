//! Home screen summary.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use spijker_core::gallery::RECENT_IMAGES_COUNT;
use spijker_core::image::ImageDescriptor;

use crate::handlers::generation::ProgressView;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub image_count: usize,
    /// Newest images, at most [`RECENT_IMAGES_COUNT`].
    pub recent_images: Vec<ImageDescriptor>,
    pub progress: ProgressView,
}

/// GET /api/v1/dashboard
///
/// Built entirely from local state, so it keeps working while the store is
/// unreachable.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DataResponse<DashboardSummary>> {
    let summary = DashboardSummary {
        image_count: state.gallery.len().await,
        recent_images: state.gallery.recent(RECENT_IMAGES_COUNT).await,
        progress: state.generations.progress().await.into(),
    };
    Json(DataResponse { data: summary })
}

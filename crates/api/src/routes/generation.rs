use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST /            -> create_generation (multipart)
/// GET  /progress    -> get_progress
/// POST /cancel      -> cancel_generation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(generation::create_generation))
        .route("/progress", get(generation::get_progress))
        .route("/cancel", post(generation::cancel_generation))
}

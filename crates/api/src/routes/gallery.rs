use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::gallery;
use crate::state::AppState;

/// Routes mounted at `/gallery`.
///
/// ```text
/// GET    /                    -> get_gallery
/// DELETE /selection           -> clear_selection
/// POST   /selection/toggle    -> toggle_selection
/// POST   /selection/all       -> toggle_select_all
/// POST   /delete              -> delete_images
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::get_gallery))
        .route("/selection", delete(gallery::clear_selection))
        .route("/selection/toggle", post(gallery::toggle_selection))
        .route("/selection/all", post(gallery::toggle_select_all))
        .route("/delete", post(gallery::delete_images))
}

use axum::routing::get;
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /                 -> list_sessions
/// GET    /{session_id}     -> get_session
/// DELETE /{session_id}     -> delete_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(session::list_sessions))
        .route(
            "/{session_id}",
            get(session::get_session).delete(session::delete_session),
        )
}

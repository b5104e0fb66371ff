pub mod dashboard;
pub mod gallery;
pub mod generation;
pub mod health;
pub mod session;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (generation + gallery events)
///
/// /dashboard                           summary (GET)
///
/// /generations                         submit (POST, multipart)
/// /generations/progress                active progress (GET)
/// /generations/cancel                  cancel active run (POST)
///
/// /sessions                            list (GET, ?limit=N)
/// /sessions/{session_id}               get, delete
///
/// /gallery                             snapshot (GET)
/// /gallery/selection                   clear (DELETE)
/// /gallery/selection/toggle            toggle one image (POST)
/// /gallery/selection/all               select all / none (POST)
/// /gallery/delete                      remove images locally (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/dashboard", dashboard::router())
        .nest("/generations", generation::router())
        .nest("/sessions", session::router())
        .nest("/gallery", gallery::router())
}

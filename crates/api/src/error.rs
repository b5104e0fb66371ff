use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spijker_core::error::CoreError;
use spijker_db::StoreError;
use spijker_pipeline::PipelineError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, store, and pipeline errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `spijker_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The session store failed or answered with an error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The generation manager rejected a request.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Store(err) => classify_store_error(err),

            AppError::Pipeline(err) => match err {
                PipelineError::Core(core) => classify_core_error(core),
                PipelineError::NoActiveGeneration => {
                    (StatusCode::CONFLICT, "CONFLICT", err.to_string())
                }
                PipelineError::ShuttingDown => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    err.to_string(),
                ),
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Store failures surface as 502. Status errors keep their generic
/// "Failed to <op> session" text; transport details are only logged.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Session store error");
    let message = match err {
        StoreError::Status { .. } | StoreError::EmptyResult { .. } => err.to_string(),
        StoreError::Request(_) | StoreError::Config(_) => {
            "Session store is unavailable".to_string()
        }
    };
    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
}

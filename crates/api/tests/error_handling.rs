//! `AppError` to HTTP response mapping.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::Value;

use spijker_api::error::AppError;
use spijker_core::error::CoreError;
use spijker_db::StoreError;
use spijker_pipeline::PipelineError;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn validation_error_is_400() {
    let (status, json) = render(CoreError::Validation("name too long".into()).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "name too long");
}

#[tokio::test]
async fn not_found_is_404() {
    let err = CoreError::NotFound {
        entity: "Image",
        id: "abc".into(),
    };
    let (status, json) = render(err.into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Image with id abc not found");
}

#[tokio::test]
async fn pipeline_conflicts_are_409() {
    let (status, json) =
        render(PipelineError::Core(CoreError::Conflict("busy".into())).into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    let (status, _) = render(PipelineError::NoActiveGeneration.into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn shutting_down_is_503() {
    let (status, json) = render(PipelineError::ShuttingDown.into()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn store_status_error_is_502_with_generic_message() {
    let err = StoreError::Status {
        operation: "update",
        status: 409,
    };
    let (status, json) = render(err.into()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "Failed to update session (HTTP 409)");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) = render(AppError::InternalError("disk on fire".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");

    let (status, json) = render(CoreError::Internal("secret detail".into()).into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_ne!(json["error"], "secret detail");
}

#[test]
fn store_errors_convert_via_from() {
    let err: AppError = StoreError::EmptyResult { operation: "create" }.into();
    assert_matches!(err, AppError::Store(StoreError::EmptyResult { .. }));
}

//! Repository for the `image_generations` table.
//!
//! Every filter, patch, and delete targets the `session_id` column. The
//! store-assigned `id` is only ever read back.

use reqwest::{Method, Response};
use spijker_core::types::SessionId;

use crate::models::generation::{CreateGeneration, GenerationSession, UpdateGeneration};
use crate::{RestStore, StoreError};

/// Table name behind the REST endpoint.
const TABLE: &str = "image_generations";

/// Provides CRUD operations for generation sessions.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new session row, returning the stored row.
    pub async fn create(
        store: &RestStore,
        input: &CreateGeneration,
    ) -> Result<GenerationSession, StoreError> {
        let response = store
            .table(Method::POST, TABLE)
            .header("Prefer", "return=representation")
            .json(input)
            .send()
            .await?;
        let rows: Vec<GenerationSession> = check(response, "create").await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or(StoreError::EmptyResult { operation: "create" })
    }

    /// Most recent sessions first, at most `limit` rows.
    pub async fn list_recent(
        store: &RestStore,
        limit: u32,
    ) -> Result<Vec<GenerationSession>, StoreError> {
        let response = store
            .table(Method::GET, TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        Ok(check(response, "list").await?.json().await?)
    }

    /// Find a session by its logical id.
    pub async fn find_by_session_id(
        store: &RestStore,
        session_id: SessionId,
    ) -> Result<Option<GenerationSession>, StoreError> {
        let response = store
            .table(Method::GET, TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("session_id", eq(session_id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<GenerationSession> = check(response, "fetch").await?.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Patch the row for `session_id`. `updated_at` is always refreshed.
    pub async fn update(
        store: &RestStore,
        session_id: SessionId,
        input: &UpdateGeneration,
    ) -> Result<(), StoreError> {
        let mut body = input.clone();
        body.updated_at = Some(chrono::Utc::now());

        let response = store
            .table(Method::PATCH, TABLE)
            .query(&[("session_id", eq(session_id))])
            .json(&body)
            .send()
            .await?;
        check(response, "update").await?;
        Ok(())
    }

    /// Delete the row for `session_id`.
    pub async fn delete(store: &RestStore, session_id: SessionId) -> Result<(), StoreError> {
        let response = store
            .table(Method::DELETE, TABLE)
            .query(&[("session_id", eq(session_id))])
            .send()
            .await?;
        check(response, "delete").await?;
        Ok(())
    }

    /// Cheapest possible read, used as a health check.
    pub async fn ping(store: &RestStore) -> Result<(), StoreError> {
        let response = store
            .table(Method::GET, TABLE)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        check(response, "reach").await?;
        Ok(())
    }
}

fn eq(session_id: SessionId) -> String {
    format!("eq.{session_id}")
}

/// Map a non-2xx response to a generic [`StoreError::Status`]. The body is
/// logged for diagnosis and otherwise discarded.
async fn check(response: Response, operation: &'static str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(operation, status = status.as_u16(), body = %body, "Store request failed");
    Err(StoreError::Status {
        operation,
        status: status.as_u16(),
    })
}

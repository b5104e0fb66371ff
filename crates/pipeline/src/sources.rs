//! Seams between the pipeline and the outside world.
//!
//! The manager only talks to these traits, so tests can drive a full run
//! with in-memory fakes and a paused clock.

use async_trait::async_trait;
use spijker_core::image::ImageDescriptor;
use spijker_core::submission::GenerationRequest;
use spijker_core::types::SessionId;
use spijker_db::models::generation::{CreateGeneration, GenerationSession, UpdateGeneration};
use spijker_db::repositories::GenerationRepo;
use spijker_db::{RestStore, StoreError};
use spijker_drive::{DriveApi, DriveApiError};
use spijker_workflow::{SubmitError, WorkflowSubmitter};
use tokio_util::sync::CancellationToken;

/// Sends a generation request and yields the results folder URL.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SubmitError>;
}

/// Lists the images currently in a folder.
#[async_trait]
pub trait FolderSource: Send + Sync {
    async fn list_images(
        &self,
        folder_id: &str,
        description: Option<&str>,
    ) -> Result<Vec<ImageDescriptor>, DriveApiError>;
}

/// Persists session rows.
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    async fn create(&self, input: &CreateGeneration) -> Result<GenerationSession, StoreError>;

    async fn update(
        &self,
        session_id: SessionId,
        patch: &UpdateGeneration,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl Submitter for WorkflowSubmitter {
    async fn submit(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SubmitError> {
        WorkflowSubmitter::submit(self, request, cancel).await
    }
}

#[async_trait]
impl FolderSource for DriveApi {
    async fn list_images(
        &self,
        folder_id: &str,
        description: Option<&str>,
    ) -> Result<Vec<ImageDescriptor>, DriveApiError> {
        self.list_folder_images(folder_id, description).await
    }
}

#[async_trait]
impl SessionRecorder for RestStore {
    async fn create(&self, input: &CreateGeneration) -> Result<GenerationSession, StoreError> {
        GenerationRepo::create(self, input).await
    }

    async fn update(
        &self,
        session_id: SessionId,
        patch: &UpdateGeneration,
    ) -> Result<(), StoreError> {
        GenerationRepo::update(self, session_id, patch).await
    }
}

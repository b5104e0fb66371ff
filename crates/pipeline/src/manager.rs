//! Owner of the active generation run.
//!
//! [`GenerationManager`] accepts one submission at a time, threads the
//! session id it generates through submit, extract, record, and poll, and
//! keeps the progress view-model current. A run is a spawned task with its
//! own [`CancellationToken`] (a child of the manager's master token).
//!
//! Starting a generation while another is still submitting is rejected.
//! Starting one while another is polling cancels the older run first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use spijker_core::error::CoreError;
use spijker_core::folder::{extract_folder_id, folder_url};
use spijker_core::image::ImageDescriptor;
use spijker_core::phase::{GenerationPhase, GenerationProgress};
use spijker_core::polling::{Exhausted, PollPolicy};
use spijker_core::session::{session_display_name, SessionStatus};
use spijker_core::submission::GenerationRequest;
use spijker_core::types::SessionId;
use spijker_db::models::generation::{CreateGeneration, UpdateGeneration};
use spijker_events::{event_types, EventBus, GenerationEvent};
use spijker_workflow::SubmitError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::gallery::SharedGallery;
use crate::poller::{poll_folder, PollEnd, PollSink, PollTarget};
use crate::sources::{FolderSource, SessionRecorder, Submitter};

/// How long to wait for a cancelled run to finish its cleanup.
const RUN_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a run task needs, shared with the manager.
struct Shared {
    submitter: Arc<dyn Submitter>,
    source: Arc<dyn FolderSource>,
    recorder: Arc<dyn SessionRecorder>,
    policy: PollPolicy,
    gallery: Arc<SharedGallery>,
    bus: Arc<EventBus>,
    progress: RwLock<GenerationProgress>,
}

/// Bookkeeping for the run currently (or most recently) spawned.
struct ActiveRun {
    session_id: SessionId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct GenerationManager {
    shared: Arc<Shared>,
    active: Mutex<Option<ActiveRun>>,
    /// Master token, cancelled on shutdown.
    cancel: CancellationToken,
}

impl GenerationManager {
    pub fn new(
        submitter: Arc<dyn Submitter>,
        source: Arc<dyn FolderSource>,
        recorder: Arc<dyn SessionRecorder>,
        policy: PollPolicy,
        gallery: Arc<SharedGallery>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                submitter,
                source,
                recorder,
                policy,
                gallery,
                bus,
                progress: RwLock::new(GenerationProgress::idle()),
            }),
            active: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.shared.policy
    }

    pub fn gallery(&self) -> &Arc<SharedGallery> {
        &self.shared.gallery
    }

    /// Current progress view-model.
    pub async fn progress(&self) -> GenerationProgress {
        self.shared.progress.read().await.clone()
    }

    /// Validate `request` and start a run. Returns the new session id.
    pub async fn start(&self, request: GenerationRequest) -> Result<SessionId, PipelineError> {
        request.validate()?;
        if self.cancel.is_cancelled() {
            return Err(PipelineError::ShuttingDown);
        }

        let mut active = self.active.lock().await;

        if let Some(run) = active.take() {
            let phase = self.shared.progress.read().await.phase;
            if !run.handle.is_finished() && phase.is_submitting() {
                *active = Some(run);
                return Err(CoreError::Conflict(
                    "A generation is already being submitted".to_string(),
                )
                .into());
            }
            stop_run(run, "superseded by a new generation").await;
        }

        let session_id = uuid::Uuid::now_v7();
        let progress = GenerationProgress::submitted(
            session_id,
            self.shared.policy.target_count,
            self.shared.policy.max_attempts,
        );
        *self.shared.progress.write().await = progress.clone();
        self.shared.bus.publish(
            GenerationEvent::new(event_types::GENERATION_SUBMITTED)
                .with_session(session_id)
                .with_payload(progress_payload(&progress)),
        );

        let cancel = self.cancel.child_token();
        let shared = Arc::clone(&self.shared);
        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            tracing::info!(%session_id, "Generation run started");
            run_generation(&shared, session_id, request, &run_cancel).await;
            tracing::info!(%session_id, "Generation run finished");
        });

        *active = Some(ActiveRun {
            session_id,
            cancel,
            handle,
        });
        Ok(session_id)
    }

    /// Cancel the running generation and wait for it to wind down.
    pub async fn cancel_active(&self) -> Result<SessionId, PipelineError> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(run) if !run.handle.is_finished() => {
                let session_id = run.session_id;
                stop_run(run, "cancelled by user").await;
                Ok(session_id)
            }
            Some(run) => {
                *active = Some(run);
                Err(PipelineError::NoActiveGeneration)
            }
            None => Err(PipelineError::NoActiveGeneration),
        }
    }

    /// Stop accepting work and cancel the active run.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down generation manager");
        self.cancel.cancel();
        if let Some(run) = self.active.lock().await.take() {
            stop_run(run, "service shutdown").await;
        }
        tracing::info!("Generation manager shut down complete");
    }
}

async fn stop_run(run: ActiveRun, reason: &str) {
    tracing::info!(session_id = %run.session_id, reason, "Stopping generation run");
    run.cancel.cancel();
    if tokio::time::timeout(RUN_STOP_TIMEOUT, run.handle).await.is_err() {
        tracing::warn!(session_id = %run.session_id, "Generation run did not stop in time");
    }
}

// ---------------------------------------------------------------------------
// Run task
// ---------------------------------------------------------------------------

/// Submit, extract the folder, record the session, poll, and finish.
async fn run_generation(
    shared: &Shared,
    session_id: SessionId,
    request: GenerationRequest,
    cancel: &CancellationToken,
) {
    let result_url = match shared.submitter.submit(&request, cancel).await {
        Ok(url) => url,
        Err(e) => {
            let phase = match e {
                SubmitError::Cancelled => GenerationPhase::Cancelled,
                SubmitError::TimedOut(_) => GenerationPhase::TimedOut,
                _ => GenerationPhase::Failed,
            };
            finish(shared, session_id, phase, e.user_message(), None).await;
            return;
        }
    };

    set_phase(
        shared,
        session_id,
        GenerationPhase::WaitingFirstResponse,
        "Processing with workflow...",
        |_| {},
    )
    .await;

    let folder_id = match extract_folder_id(&result_url) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(%session_id, result_url = %result_url, error = %e, "No folder id in workflow result");
            finish(
                shared,
                session_id,
                GenerationPhase::Failed,
                "The workflow result did not contain a folder link.".to_string(),
                None,
            )
            .await;
            return;
        }
    };

    let created_at = chrono::Utc::now();
    let input = CreateGeneration::processing(
        session_id,
        session_display_name(request.name(), created_at),
        folder_id.clone(),
        Some(folder_url(&folder_id)),
        shared.policy.target_count,
    );
    let recorded = match shared.recorder.create(&input).await {
        Ok(stored) => Some(SessionRow::new(session_id, stored.status)),
        Err(e) => {
            tracing::warn!(%session_id, error = %e, "Failed to record session, polling anyway");
            None
        }
    };
    let row = recorded.as_ref();

    if cancel.is_cancelled() {
        patch(shared, row, UpdateGeneration::status(SessionStatus::Cancelled)).await;
        finish(shared, session_id, GenerationPhase::Cancelled, cancelled_message(), None).await;
        return;
    }

    let status = format!(
        "Generating variations (0/{} images)...",
        shared.policy.target_count
    );
    let polled_folder = folder_id.clone();
    set_phase(shared, session_id, GenerationPhase::Polling, status, move |p| {
        p.folder_id = Some(polled_folder);
    })
    .await;
    shared.bus.publish(
        GenerationEvent::new(event_types::GENERATION_POLLING)
            .with_session(session_id)
            .with_payload(json!({ "folder_id": folder_id, "folder_url": folder_url(&folder_id) })),
    );

    tracing::info!(
        %session_id,
        %folder_id,
        budget_secs = shared.policy.total_budget().as_secs(),
        "Polling output folder"
    );
    let sink = RunSink {
        shared,
        session_id,
        folder_id: &folder_id,
        row,
    };
    let target = PollTarget {
        folder_id: &folder_id,
        description: request.description(),
    };
    let end = poll_folder(shared.source.as_ref(), &shared.policy, target, cancel, &sink).await;

    let target_count = shared.policy.target_count;
    match end {
        PollEnd::Completed { images } => {
            let message = format!("Complete! {} images generated.", images.len());
            finish(shared, session_id, GenerationPhase::Completed, message, Some(images.len())).await;
        }
        PollEnd::Exhausted {
            outcome: Exhausted::TimedOut,
            ..
        } => {
            let message = "No images were generated before the time limit.".to_string();
            patch(
                shared,
                row,
                UpdateGeneration::status(SessionStatus::Failed).with_error(message.clone()),
            )
            .await;
            finish(shared, session_id, GenerationPhase::TimedOut, message, Some(0)).await;
        }
        PollEnd::Exhausted {
            outcome: Exhausted::PartialSuccess { found },
            ..
        } => {
            patch(shared, row, UpdateGeneration::status(SessionStatus::Completed)).await;
            let message = format!("Completed with {found} of {target_count} images.");
            finish(shared, session_id, GenerationPhase::Completed, message, Some(found as usize)).await;
        }
        PollEnd::Exhausted {
            outcome: Exhausted::PartialFailure { found },
            ..
        } => {
            let message = format!("Only {found} of {target_count} images were generated.");
            patch(
                shared,
                row,
                UpdateGeneration::status(SessionStatus::Failed).with_error(message.clone()),
            )
            .await;
            finish(shared, session_id, GenerationPhase::Failed, message, Some(found as usize)).await;
        }
        PollEnd::Failed(e) => {
            let message = e.to_string();
            patch(
                shared,
                row,
                UpdateGeneration::status(SessionStatus::Failed).with_error(message.clone()),
            )
            .await;
            finish(shared, session_id, GenerationPhase::Failed, message, None).await;
        }
        PollEnd::Cancelled { images } => {
            patch(shared, row, UpdateGeneration::status(SessionStatus::Cancelled)).await;
            finish(
                shared,
                session_id,
                GenerationPhase::Cancelled,
                cancelled_message(),
                Some(images.len()),
            )
            .await;
        }
    }
}

fn cancelled_message() -> String {
    "Generation was cancelled.".to_string()
}

/// The store row owned by a run and the status last written to it.
struct SessionRow {
    session_id: SessionId,
    status: Mutex<SessionStatus>,
}

impl SessionRow {
    fn new(session_id: SessionId, status: SessionStatus) -> Self {
        Self {
            session_id,
            status: Mutex::new(status),
        }
    }

    /// Check `update` against the row's lifecycle and record its status.
    ///
    /// A terminal row accepts no further patches. A status change must be
    /// a legal [`SessionStatus::transition_to`] step.
    async fn admit(&self, update: &UpdateGeneration) -> bool {
        let mut current = self.status.lock().await;
        if current.is_terminal() {
            tracing::warn!(
                session_id = %self.session_id,
                status = %*current,
                "Session is already terminal, skipping update"
            );
            return false;
        }
        if let Some(next) = update.status {
            match current.transition_to(next) {
                Ok(status) => *current = status,
                Err(e) => {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Skipping session update");
                    return false;
                }
            }
        }
        true
    }
}

/// Patch the session row when one was recorded. Store failures are logged
/// and otherwise ignored.
async fn patch(shared: &Shared, row: Option<&SessionRow>, update: UpdateGeneration) {
    let Some(row) = row else {
        return;
    };
    if !row.admit(&update).await {
        return;
    }
    if let Err(e) = shared.recorder.update(row.session_id, &update).await {
        tracing::warn!(session_id = %row.session_id, error = %e, "Failed to update session");
    }
}

/// Move this run's progress to `phase`, unless a newer run owns it.
async fn set_phase<F>(
    shared: &Shared,
    session_id: SessionId,
    phase: GenerationPhase,
    status: impl Into<String>,
    also: F,
) -> Option<GenerationProgress>
where
    F: FnOnce(&mut GenerationProgress),
{
    let mut progress = shared.progress.write().await;
    if progress.session_id != Some(session_id) {
        return None;
    }
    if let Err(e) = progress.advance(phase, status) {
        tracing::warn!(%session_id, error = %e, "Ignoring progress transition");
        return None;
    }
    also(&mut progress);
    Some(progress.clone())
}

/// Terminal transition plus its event.
async fn finish(
    shared: &Shared,
    session_id: SessionId,
    phase: GenerationPhase,
    message: String,
    image_count: Option<usize>,
) {
    let is_error = matches!(phase, GenerationPhase::Failed | GenerationPhase::TimedOut);
    let error = is_error.then(|| message.clone());
    let snapshot = set_phase(shared, session_id, phase, message.clone(), |p| {
        p.error = error;
    })
    .await;

    let event_type = match phase {
        GenerationPhase::Completed => event_types::GENERATION_COMPLETED,
        GenerationPhase::Cancelled => event_types::GENERATION_CANCELLED,
        _ => event_types::GENERATION_FAILED,
    };
    let mut payload = snapshot
        .as_ref()
        .map(progress_payload)
        .unwrap_or_else(|| json!({}));
    payload["message"] = json!(message);
    payload["phase"] = json!(phase);
    if let Some(count) = image_count {
        payload["image_count"] = json!(count);
    }

    if is_error {
        tracing::warn!(%session_id, ?phase, %message, "Generation ended");
    } else {
        tracing::info!(%session_id, ?phase, %message, "Generation ended");
    }
    shared.bus.publish(
        GenerationEvent::new(event_type)
            .with_session(session_id)
            .with_payload(payload),
    );
}

fn progress_payload(progress: &GenerationProgress) -> serde_json::Value {
    serde_json::to_value(progress).unwrap_or_else(|_| json!({}))
}

// ---------------------------------------------------------------------------
// Poll sink
// ---------------------------------------------------------------------------

/// Applies poll observations to progress, gallery, store, and bus.
struct RunSink<'a> {
    shared: &'a Shared,
    session_id: SessionId,
    folder_id: &'a str,
    row: Option<&'a SessionRow>,
}

#[async_trait]
impl<'a> PollSink for RunSink<'a> {
    async fn on_tick(&self, attempt: u32, found: u32) {
        let snapshot = {
            let mut progress = self.shared.progress.write().await;
            if progress.session_id != Some(self.session_id) {
                return;
            }
            progress.record_tick(attempt, found);
            progress.clone()
        };
        self.shared.bus.publish(
            GenerationEvent::new(event_types::GENERATION_PROGRESS)
                .with_session(self.session_id)
                .with_payload(progress_payload(&snapshot)),
        );
    }

    async fn on_reconcile(&self, images: &[ImageDescriptor], completed: bool) {
        self.shared
            .gallery
            .replace_folder_images(self.folder_id, images.to_vec())
            .await;

        let mut update = UpdateGeneration::images(images.to_vec());
        if completed {
            update = update.with_status(SessionStatus::Completed);
        }
        patch(self.shared, self.row, update).await;
    }
}

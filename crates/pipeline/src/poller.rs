//! Folder polling loop.
//!
//! Waits one interval, lists the folder, asks
//! [`evaluate_tick`](spijker_core::polling::evaluate_tick) what to do, and
//! repeats until the run completes, the budget is spent, a fatal listing
//! error occurs, or the token is cancelled. No tick happens after any of
//! those.

use async_trait::async_trait;
use spijker_core::image::ImageDescriptor;
use spijker_core::polling::{evaluate_failed_tick, evaluate_tick, Exhausted, NextStep, PollPolicy};
use spijker_drive::DriveApiError;
use tokio_util::sync::CancellationToken;

use crate::sources::FolderSource;

/// Receives observations while a poll is running.
#[async_trait]
pub trait PollSink: Send + Sync {
    /// Called once per tick with the count observed (or the best count so
    /// far when the listing failed).
    async fn on_tick(&self, attempt: u32, found: u32);

    /// Called when the listing grew or reached the target. `images` is the
    /// full listing; `completed` is set when the target was reached.
    async fn on_reconcile(&self, images: &[ImageDescriptor], completed: bool);
}

/// How a poll ended.
#[derive(Debug)]
pub enum PollEnd {
    /// Target reached.
    Completed { images: Vec<ImageDescriptor> },
    /// Attempt budget spent.
    Exhausted {
        outcome: Exhausted,
        images: Vec<ImageDescriptor>,
    },
    /// A listing error that asking again will not fix.
    Failed(DriveApiError),
    Cancelled { images: Vec<ImageDescriptor> },
}

/// What one poll is looking at.
#[derive(Debug, Clone, Copy)]
pub struct PollTarget<'a> {
    pub folder_id: &'a str,
    /// Submission description, stamped onto descriptors as their prompt.
    pub description: Option<&'a str>,
}

/// Poll `target` under `policy` until a terminal outcome.
pub async fn poll_folder(
    source: &dyn FolderSource,
    policy: &PollPolicy,
    target: PollTarget<'_>,
    cancel: &CancellationToken,
    sink: &dyn PollSink,
) -> PollEnd {
    let mut reconciled: u32 = 0;
    let mut latest: Vec<ImageDescriptor> = Vec::new();
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollEnd::Cancelled { images: latest },
            _ = tokio::time::sleep(policy.interval) => {}
        }
        attempt += 1;

        let listing = tokio::select! {
            _ = cancel.cancelled() => return PollEnd::Cancelled { images: latest },
            listing = source.list_images(target.folder_id, target.description) => listing,
        };

        let next = match listing {
            Ok(images) => {
                let found = u32::try_from(images.len()).unwrap_or(u32::MAX);
                let outcome = evaluate_tick(policy, attempt, reconciled, found);
                tracing::debug!(
                    folder_id = target.folder_id,
                    attempt,
                    found,
                    target = policy.target_count,
                    "Poll tick",
                );
                sink.on_tick(attempt, found).await;
                if outcome.reconcile {
                    reconciled = found;
                    latest = images;
                    sink.on_reconcile(&latest, outcome.next == NextStep::Completed)
                        .await;
                }
                outcome.next
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(folder_id = target.folder_id, attempt, error = %e, "Folder listing failed");
                return PollEnd::Failed(e);
            }
            Err(e) => {
                tracing::warn!(folder_id = target.folder_id, attempt, error = %e, "Folder listing failed, will retry");
                sink.on_tick(attempt, reconciled).await;
                evaluate_failed_tick(policy, attempt, reconciled)
            }
        };

        match next {
            NextStep::Continue => {}
            NextStep::Completed => return PollEnd::Completed { images: latest },
            NextStep::Exhausted(outcome) => {
                return PollEnd::Exhausted {
                    outcome,
                    images: latest,
                }
            }
        }
    }
}

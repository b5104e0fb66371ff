//! Generation run phases and the progress view-model shown while a run is
//! active.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{SessionId, Timestamp};

/// Phase of the active generation run.
///
/// ```text
/// idle -> submitted -> waiting_first_response -> polling -> completed
///                                                         -> timed_out
///                                                         -> failed
/// ```
///
/// `cancelled` is reachable from every non-terminal phase except `idle`.
/// Submission failures move `submitted` straight to `failed`/`timed_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Idle,
    Submitted,
    WaitingFirstResponse,
    Polling,
    Completed,
    TimedOut,
    Failed,
    Cancelled,
}

impl GenerationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::TimedOut | Self::Failed | Self::Cancelled
        )
    }

    /// The webhook request has not produced a folder yet.
    pub fn is_submitting(self) -> bool {
        matches!(self, Self::Submitted | Self::WaitingFirstResponse)
    }

    pub fn can_transition_to(self, next: GenerationPhase) -> bool {
        use GenerationPhase::*;
        match (self, next) {
            (Idle, Submitted) => true,
            (s, Submitted) if s.is_terminal() => true,
            (Submitted, WaitingFirstResponse | Failed | TimedOut | Cancelled) => true,
            (WaitingFirstResponse, Polling | Failed | Cancelled) => true,
            (Polling, Completed | TimedOut | Failed | Cancelled) => true,
            _ => false,
        }
    }
}

/// Progress snapshot for the active (or most recent) run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationProgress {
    pub phase: GenerationPhase,
    pub session_id: Option<SessionId>,
    pub folder_id: Option<String>,
    /// Human-readable status line.
    pub status: String,
    pub found_count: u32,
    pub target_count: u32,
    /// Ticks performed so far.
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: Option<String>,
    pub updated_at: Timestamp,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::idle()
    }
}

impl GenerationProgress {
    pub fn idle() -> Self {
        Self {
            phase: GenerationPhase::Idle,
            session_id: None,
            folder_id: None,
            status: String::new(),
            found_count: 0,
            target_count: 0,
            attempt: 0,
            max_attempts: 0,
            error: None,
            updated_at: chrono::Utc::now(),
        }
    }

    /// Fresh progress for a newly submitted run.
    pub fn submitted(session_id: SessionId, target_count: u32, max_attempts: u32) -> Self {
        Self {
            phase: GenerationPhase::Submitted,
            session_id: Some(session_id),
            status: "Uploading assets...".to_string(),
            target_count,
            max_attempts,
            ..Self::idle()
        }
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(
        &mut self,
        next: GenerationPhase,
        status: impl Into<String>,
    ) -> Result<(), CoreError> {
        if !self.phase.can_transition_to(next) {
            return Err(CoreError::Conflict(format!(
                "Generation cannot move from {:?} to {:?}",
                self.phase, next
            )));
        }
        self.phase = next;
        self.status = status.into();
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Record a polling observation without changing phase.
    pub fn record_tick(&mut self, attempt: u32, found: u32) {
        self.attempt = attempt;
        self.found_count = self.found_count.max(found);
        self.status = format!(
            "Generating variations ({}/{} images)...",
            self.found_count, self.target_count
        );
        self.updated_at = chrono::Utc::now();
    }

    /// Percentage of target images found, capped at 100.
    pub fn percent(&self) -> u8 {
        if self.target_count == 0 {
            return 0;
        }
        let pct = (u64::from(self.found_count) * 100) / u64::from(self.target_count);
        pct.min(100) as u8
    }
}

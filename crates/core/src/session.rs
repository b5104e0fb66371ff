//! Generation session status and naming rules.
//!
//! A session is one generation run, persisted as a row in the remote
//! `image_generations` table. The row itself lives in `spijker-db`; this
//! module owns the status lifecycle so every writer enforces the same
//! transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default number of sessions returned by the recent-sessions listing.
pub const DEFAULT_SESSION_LIST_LIMIT: u32 = 10;

/// Upper bound accepted for the recent-sessions listing.
pub const MAX_SESSION_LIST_LIMIT: u32 = 100;

/// Maximum length for a user-supplied session name.
pub const MAX_SESSION_NAME_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a generation session.
///
/// The only legal transitions are `processing -> {completed, failed,
/// cancelled}`. Terminal states never return to `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    /// Wire representation used by the remote store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (
                Self::Processing,
                Self::Completed | Self::Failed | Self::Cancelled
            )
        )
    }

    /// Validate a transition, returning the new status on success.
    pub fn transition_to(self, next: SessionStatus) -> Result<SessionStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::Conflict(format!(
                "Session cannot move from '{self}' to '{next}'"
            )))
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown session status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Naming / listing helpers
// ---------------------------------------------------------------------------

/// Display name for a new session: the trimmed user-supplied name, or a
/// timestamped fallback when none was given.
pub fn session_display_name(name: Option<&str>, created_at: Timestamp) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => format!("Generation {}", created_at.format("%Y-%m-%d %H:%M")),
    }
}

/// Validate a user-supplied session name.
pub fn validate_session_name(name: &str) -> Result<(), CoreError> {
    if name.chars().count() > MAX_SESSION_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Session name exceeds maximum length of {MAX_SESSION_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Clamp a requested listing limit into `1..=MAX_SESSION_LIST_LIMIT`,
/// falling back to [`DEFAULT_SESSION_LIST_LIMIT`].
pub fn clamp_list_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_SESSION_LIST_LIMIT)
        .clamp(1, MAX_SESSION_LIST_LIMIT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

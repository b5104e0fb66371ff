//! Folder polling policy and per-tick decisions.
//!
//! The poller itself (timers, network, cancellation) lives in
//! `spijker-pipeline`. This module decides, for a given observation, whether
//! to reconcile the session and whether to keep ticking.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Delay before the first tick and between subsequent ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Attempt budget; 20 ticks at 30 s is roughly ten minutes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
/// Number of images a workflow run is expected to produce.
pub const DEFAULT_TARGET_IMAGES: u32 = 8;

// ---------------------------------------------------------------------------
// Exhaustion policy
// ---------------------------------------------------------------------------

/// What to do when the attempt budget runs out with some, but not all,
/// of the target images found.
///
/// Running out with zero images is always a timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Stop polling and report the partial count as a success.
    #[default]
    TreatPartialAsSuccess,
    /// Stop polling and fail the run.
    Fail,
}

impl ExhaustionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TreatPartialAsSuccess => "treat_partial_as_success",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExhaustionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "treat_partial_as_success" => Ok(Self::TreatPartialAsSuccess),
            "fail" => Ok(Self::Fail),
            other => Err(CoreError::Validation(format!(
                "Invalid exhaustion policy '{other}'. Must be one of: treat_partial_as_success, fail"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable parameters for one polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub target_count: u32,
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            target_count: DEFAULT_TARGET_IMAGES,
            on_exhausted: ExhaustionPolicy::default(),
        }
    }
}

impl PollPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::Validation(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Validation(
                "Poll attempt budget must be at least 1".to_string(),
            ));
        }
        if self.target_count == 0 {
            return Err(CoreError::Validation(
                "Target image count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rough wall-clock ceiling of a full run.
    pub fn total_budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// Tick decisions
// ---------------------------------------------------------------------------

/// How a run ended after the attempt budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// No image was ever observed.
    TimedOut,
    /// Some images were observed and the policy accepts that.
    PartialSuccess { found: u32 },
    /// Some images were observed and the policy rejects that.
    PartialFailure { found: u32 },
}

/// What the poller does after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Schedule another tick after the interval.
    Continue,
    /// Target reached; stop.
    Completed,
    /// Budget spent; stop.
    Exhausted(Exhausted),
}

impl NextStep {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Result of evaluating a successful listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Replace the session's image list and patch the row.
    pub reconcile: bool,
    pub next: NextStep,
}

/// Evaluate a successful listing on tick `attempt` (1-based).
///
/// The session is reconciled when the found count grew or reached the
/// target. The run completes as soon as `found >= target`.
pub fn evaluate_tick(policy: &PollPolicy, attempt: u32, previous: u32, found: u32) -> TickOutcome {
    let reached = found >= policy.target_count;
    let reconcile = found > previous || reached;

    let next = if reached {
        NextStep::Completed
    } else if attempt >= policy.max_attempts {
        NextStep::Exhausted(exhaustion(policy, found))
    } else {
        NextStep::Continue
    };

    TickOutcome { reconcile, next }
}

/// Evaluate a tick whose listing failed with a retryable error.
///
/// The failed tick still consumes its attempt; `previous` is the best count
/// observed so far.
pub fn evaluate_failed_tick(policy: &PollPolicy, attempt: u32, previous: u32) -> NextStep {
    if attempt >= policy.max_attempts {
        NextStep::Exhausted(exhaustion(policy, previous))
    } else {
        NextStep::Continue
    }
}

fn exhaustion(policy: &PollPolicy, found: u32) -> Exhausted {
    if found == 0 {
        Exhausted::TimedOut
    } else {
        match policy.on_exhausted {
            ExhaustionPolicy::TreatPartialAsSuccess => Exhausted::PartialSuccess { found },
            ExhaustionPolicy::Fail => Exhausted::PartialFailure { found },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy::default()
    }

    // -- Defaults --

    #[test]
    fn defaults_match_ten_minute_budget() {
        let p = policy();
        assert_eq!(p.interval, Duration::from_secs(30));
        assert_eq!(p.max_attempts, 20);
        assert_eq!(p.target_count, 8);
        assert_eq!(p.on_exhausted, ExhaustionPolicy::TreatPartialAsSuccess);
        assert_eq!(p.total_budget(), Duration::from_secs(600));
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut p = policy();
        p.max_attempts = 0;
        assert!(p.validate().is_err());

        let mut p = policy();
        p.target_count = 0;
        assert!(p.validate().is_err());

        let mut p = policy();
        p.interval = Duration::ZERO;
        assert!(p.validate().is_err());
    }

    // -- Successful ticks --

    #[test]
    fn no_growth_means_no_reconcile() {
        let out = evaluate_tick(&policy(), 1, 0, 0);
        assert!(!out.reconcile);
        assert_eq!(out.next, NextStep::Continue);
    }

    #[test]
    fn growth_reconciles_and_continues() {
        let out = evaluate_tick(&policy(), 2, 0, 3);
        assert!(out.reconcile);
        assert_eq!(out.next, NextStep::Continue);
    }

    #[test]
    fn reaching_target_completes() {
        let out = evaluate_tick(&policy(), 3, 3, 8);
        assert!(out.reconcile);
        assert_eq!(out.next, NextStep::Completed);
    }

    #[test]
    fn exceeding_target_also_completes() {
        let out = evaluate_tick(&policy(), 3, 0, 11);
        assert_eq!(out.next, NextStep::Completed);
    }

    #[test]
    fn target_reached_on_last_attempt_is_completion_not_exhaustion() {
        let out = evaluate_tick(&policy(), 20, 7, 8);
        assert_eq!(out.next, NextStep::Completed);
    }

    #[test]
    fn zero_images_at_last_attempt_times_out() {
        let out = evaluate_tick(&policy(), 20, 0, 0);
        assert_eq!(out.next, NextStep::Exhausted(Exhausted::TimedOut));
    }

    #[test]
    fn zero_images_before_last_attempt_keeps_going() {
        let out = evaluate_tick(&policy(), 19, 0, 0);
        assert_eq!(out.next, NextStep::Continue);
    }

    #[test]
    fn partial_count_follows_policy() {
        let out = evaluate_tick(&policy(), 20, 5, 5);
        assert_eq!(
            out.next,
            NextStep::Exhausted(Exhausted::PartialSuccess { found: 5 })
        );

        let strict = PollPolicy {
            on_exhausted: ExhaustionPolicy::Fail,
            ..policy()
        };
        let out = evaluate_tick(&strict, 20, 5, 5);
        assert_eq!(
            out.next,
            NextStep::Exhausted(Exhausted::PartialFailure { found: 5 })
        );
    }

    // -- Failed ticks --

    #[test]
    fn failed_tick_consumes_attempt() {
        assert_eq!(evaluate_failed_tick(&policy(), 4, 0), NextStep::Continue);
        assert_eq!(
            evaluate_failed_tick(&policy(), 20, 0),
            NextStep::Exhausted(Exhausted::TimedOut)
        );
        assert_eq!(
            evaluate_failed_tick(&policy(), 20, 2),
            NextStep::Exhausted(Exhausted::PartialSuccess { found: 2 })
        );
    }

    // -- Policy parsing --

    #[test]
    fn exhaustion_policy_parses() {
        assert_eq!(
            "fail".parse::<ExhaustionPolicy>().unwrap(),
            ExhaustionPolicy::Fail
        );
        assert_eq!(
            "treat_partial_as_success".parse::<ExhaustionPolicy>().unwrap(),
            ExhaustionPolicy::TreatPartialAsSuccess
        );
        assert!("maybe".parse::<ExhaustionPolicy>().is_err());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use spijker_core::polling::{ExhaustionPolicy, PollPolicy};
use spijker_core::session::DEFAULT_SESSION_LIST_LIMIT;

/// Server configuration loaded from environment variables.
///
/// All fields except the webhook URL have defaults suitable for local
/// development. Store and Drive settings are loaded by their own crates.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on winding down the active generation at shutdown.
    pub shutdown_timeout_secs: u64,
    /// Maximum multipart upload size in megabytes (default: `50`).
    pub max_upload_mb: usize,
    /// Workflow webhook that receives generation requests.
    pub workflow_webhook_url: String,
    /// How long to wait for the webhook to answer (default: `600`).
    pub workflow_timeout_secs: u64,
    /// Default page size for session listings (default: `10`).
    pub session_list_limit: u32,
    /// Folder polling parameters.
    pub poll: PollPolicy,
    /// Where the gallery history is persisted.
    pub history_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_UPLOAD_MB`         | `50`                       |
    /// | `WORKFLOW_WEBHOOK_URL`  | required                   |
    /// | `WORKFLOW_TIMEOUT_SECS` | `600`                      |
    /// | `SESSION_LIST_LIMIT`    | `10`                       |
    /// | `POLL_INTERVAL_SECS`    | `30`                       |
    /// | `POLL_MAX_ATTEMPTS`     | `20`                       |
    /// | `POLL_TARGET_IMAGES`    | `8`                        |
    /// | `POLL_ON_EXHAUSTED`     | `treat_partial_as_success` |
    /// | `HISTORY_PATH`          | `data/history.json`        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let max_upload_mb: usize = std::env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("MAX_UPLOAD_MB must be a valid usize");

        let workflow_webhook_url =
            std::env::var("WORKFLOW_WEBHOOK_URL").expect("WORKFLOW_WEBHOOK_URL must be set");

        let workflow_timeout_secs: u64 = std::env::var("WORKFLOW_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("WORKFLOW_TIMEOUT_SECS must be a valid u64");

        let session_list_limit: u32 = std::env::var("SESSION_LIST_LIMIT")
            .map(|v| v.parse::<u32>().expect("SESSION_LIST_LIMIT must be a valid u32"))
            .unwrap_or(DEFAULT_SESSION_LIST_LIMIT);

        let history_path: PathBuf = std::env::var("HISTORY_PATH")
            .unwrap_or_else(|_| "data/history.json".into())
            .into();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            max_upload_mb,
            workflow_webhook_url,
            workflow_timeout_secs,
            session_list_limit,
            poll: poll_policy_from_env(),
            history_path,
        }
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Read the `POLL_*` variables on top of [`PollPolicy::default`].
fn poll_policy_from_env() -> PollPolicy {
    let defaults = PollPolicy::default();

    let interval = std::env::var("POLL_INTERVAL_SECS")
        .map(|v| {
            Duration::from_secs(v.parse::<u64>().expect("POLL_INTERVAL_SECS must be a valid u64"))
        })
        .unwrap_or(defaults.interval);

    let max_attempts = std::env::var("POLL_MAX_ATTEMPTS")
        .map(|v| v.parse::<u32>().expect("POLL_MAX_ATTEMPTS must be a valid u32"))
        .unwrap_or(defaults.max_attempts);

    let target_count = std::env::var("POLL_TARGET_IMAGES")
        .map(|v| v.parse::<u32>().expect("POLL_TARGET_IMAGES must be a valid u32"))
        .unwrap_or(defaults.target_count);

    let on_exhausted = std::env::var("POLL_ON_EXHAUSTED")
        .map(|v| {
            v.parse::<ExhaustionPolicy>()
                .unwrap_or_else(|e| panic!("POLL_ON_EXHAUSTED: {e}"))
        })
        .unwrap_or(defaults.on_exhausted);

    PollPolicy {
        interval,
        max_attempts,
        target_count,
        on_exhausted,
    }
}

use std::time::Duration;

/// Failure of a single webhook submission. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The request exceeded the configured ceiling.
    #[error("Workflow request timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The caller cancelled the run while the request was in flight.
    #[error("Workflow request was cancelled")]
    Cancelled,

    /// Connection, DNS, TLS, or body read failure.
    #[error("Workflow request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The workflow answered with a non-2xx status.
    #[error("Workflow returned HTTP {0}")]
    HttpStatus(u16),

    /// 2xx with nothing in the body.
    #[error("Workflow returned an empty response")]
    EmptyResponse,

    /// The body was neither `{"resultUrl": ...}` nor a bare URL.
    #[error("Workflow response did not contain a result URL")]
    MissingResultUrl,

    /// The webhook endpoint or multipart payload could not be built.
    #[error("Invalid workflow configuration: {0}")]
    Config(String),
}

impl SubmitError {
    /// Message suitable for showing to the person who submitted the run.
    pub fn user_message(&self) -> String {
        let msg = match self {
            Self::TimedOut(limit) => {
                return format!(
                    "Request timed out after {} minutes. Please try again.",
                    limit.as_secs().div_ceil(60)
                )
            }
            Self::Cancelled => "Generation was cancelled.",
            Self::Network(_) => "Failed to process. Please try again.",
            Self::HttpStatus(_) => "Failed to process the request.",
            Self::EmptyResponse => "The workflow returned an empty response.",
            Self::MissingResultUrl => "The workflow did not return a results folder.",
            Self::Config(_) => "The workflow endpoint is not configured correctly.",
        };
        msg.to_string()
    }
}

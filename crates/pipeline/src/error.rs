use spijker_core::error::CoreError;

/// Errors returned synchronously by [`GenerationManager`](crate::GenerationManager).
///
/// Failures inside a running generation are not returned; they end the
/// run and are reported through progress and events.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Validation or state-machine rejection from the domain layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Cancel was requested but nothing is running.
    #[error("No generation is currently running")]
    NoActiveGeneration,

    /// The manager is shutting down and accepts no new work.
    #[error("Generation service is shutting down")]
    ShuttingDown,
}

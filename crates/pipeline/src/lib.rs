//! Generation pipeline: submit to the workflow, record the session, poll
//! the results folder, and reconcile what appears into the gallery.
//!
//! - [`sources`]: the async seams to the three external systems.
//! - [`poller`]: the cancellable folder polling loop.
//! - [`gallery`]: the shared, persisted gallery.
//! - [`manager`]: [`GenerationManager`], owner of the active run.

pub mod error;
pub mod gallery;
pub mod manager;
pub mod poller;
pub mod sources;

pub use error::PipelineError;
pub use gallery::SharedGallery;
pub use manager::GenerationManager;
pub use poller::{poll_folder, PollEnd, PollSink};
pub use sources::{FolderSource, SessionRecorder, Submitter};

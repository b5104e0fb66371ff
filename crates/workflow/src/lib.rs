//! Upload submitter for the external generation workflow.
//!
//! One multipart `POST` per run, no retries. The workflow answers with the
//! URL of the folder it will write generated images into.

pub mod error;
pub mod result;
pub mod submitter;

pub use error::SubmitError;
pub use result::parse_result_body;
pub use submitter::{WorkflowConfig, WorkflowSubmitter};

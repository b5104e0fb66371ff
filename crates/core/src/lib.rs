//! Domain types and pure logic for the Spijker generation dashboard.
//!
//! Nothing in this crate talks to the network. The HTTP clients
//! (`spijker-db`, `spijker-drive`, `spijker-workflow`) and the poller
//! (`spijker-pipeline`) build on the types and decisions defined here.

pub mod error;
pub mod folder;
pub mod gallery;
pub mod history;
pub mod image;
pub mod phase;
pub mod polling;
pub mod session;
pub mod submission;
pub mod types;

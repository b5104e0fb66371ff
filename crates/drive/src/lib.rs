//! Client for the Google Drive file-listing API.
//!
//! The poller only needs one call: list the children of a folder and keep
//! the image files. [`DriveApi`] wraps that call; [`files`] holds the wire
//! types and their conversion into gallery descriptors.

pub mod api;
pub mod files;

pub use api::{DriveApi, DriveApiError, DriveConfig};
pub use files::DriveFile;

//! Event type names published on the bus.

/// Webhook request accepted for sending.
pub const GENERATION_SUBMITTED: &str = "generation.submitted";
/// Results folder known; polling has started.
pub const GENERATION_POLLING: &str = "generation.polling";
/// A poll tick observed new images.
pub const GENERATION_PROGRESS: &str = "generation.progress";
pub const GENERATION_COMPLETED: &str = "generation.completed";
/// Submission, extraction, or polling failed (including timeouts).
pub const GENERATION_FAILED: &str = "generation.failed";
pub const GENERATION_CANCELLED: &str = "generation.cancelled";
/// Images were removed from the in-memory gallery.
pub const GALLERY_IMAGES_DELETED: &str = "gallery.images_deleted";

/// Logical generation-session identifier. Generated by this service and
/// threaded through the whole submit -> poll chain.
pub type SessionId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

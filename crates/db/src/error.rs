/// Errors from the session store.
///
/// Any non-2xx response is reported as a generic failure for the attempted
/// operation; the store's error body is logged, not decoded.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("Store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("Failed to {operation} session (HTTP {status})")]
    Status { operation: &'static str, status: u16 },

    /// A write that should return the affected row returned nothing.
    #[error("Store returned no row for {operation}")]
    EmptyResult { operation: &'static str },

    /// Missing or malformed connection settings.
    #[error("Invalid store configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_is_generic() {
        let err = StoreError::Status {
            operation: "update",
            status: 409,
        };
        assert_eq!(err.to_string(), "Failed to update session (HTTP 409)");
    }
}

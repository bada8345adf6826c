//! Backend error types.

/// Errors that can occur talking to the remote data service.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Transport-level failure (connection refused, timeout, DNS).
    Http(String),
    /// Service responded with a non-success status.
    Status(u16, String),
    /// A uniqueness constraint rejected the write.
    Conflict,
    /// The session is missing, expired, or not allowed to touch the row.
    Unauthorized,
    /// Response body could not be decoded.
    Decode(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Http(e) => write!(f, "HTTP error: {}", e),
            BackendError::Status(code, body) => {
                write!(f, "Server returned status {}: {}", code, body)
            }
            BackendError::Conflict => write!(f, "Conflict: the row already exists"),
            BackendError::Unauthorized => write!(f, "Not authorized"),
            BackendError::Decode(e) => write!(f, "Failed to decode response: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

//! Error types for TaskHub API operations

use thiserror::Error;

/// Errors surfaced by the TaskHub API client.
///
/// Only `Connection` is transient; the retry loop in the client retries that
/// class and nothing else. Messages carry the remote status and error text
/// but never the target host, the token, or a backtrace.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was rejected as malformed (400-class)
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or rejected credential (401/403)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The remote entity does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure or 5xx/429/408 from the remote; retried up to the bound
    #[error("TaskHub API unavailable: {0}")]
    Connection(String),

    /// Anything else
    #[error("unexpected TaskHub API error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Whether the retry loop may try this failure again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Connection(_))
    }

    /// Classify a non-success HTTP status plus the remote error message
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => ApiError::Validation(message),
            401 | 403 => ApiError::Authentication(message),
            404 => ApiError::NotFound(message),
            408 | 429 => ApiError::Connection(format!("status {status}: {message}")),
            s if s >= 500 => ApiError::Connection(format!("status {status}: {message}")),
            s => ApiError::Unknown(format!("status {s}: {message}")),
        }
    }
}

/// Result type alias for TaskHub API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert!(matches!(
            ApiError::from_status(400, String::new()),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from_status(401, String::new()),
            ApiError::Authentication(_)
        ));
        assert!(matches!(
            ApiError::from_status(404, String::new()),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(429, String::new()),
            ApiError::Connection(_)
        ));
        assert!(matches!(
            ApiError::from_status(503, String::new()),
            ApiError::Connection(_)
        ));
        assert!(matches!(
            ApiError::from_status(418, String::new()),
            ApiError::Unknown(_)
        ));
    }

    #[test]
    fn only_connection_errors_retry() {
        assert!(ApiError::Connection("boom".into()).is_retryable());
        assert!(!ApiError::Validation("bad".into()).is_retryable());
        assert!(!ApiError::Authentication("no".into()).is_retryable());
        assert!(!ApiError::NotFound("gone".into()).is_retryable());
        assert!(!ApiError::Unknown("what".into()).is_retryable());
    }
}

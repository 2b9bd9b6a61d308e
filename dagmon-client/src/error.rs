//! Error types for the dagmon client

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Coarse classification used by callers to decide between retry and abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The calling context asked to stop; never retried
    Cancelled,
    /// Any other failure; may succeed on a later attempt
    Transient,
}

/// Errors that can occur when talking to the DAG service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// DAG not found
    #[error("DAG not found: {0}")]
    NotFound(String),

    /// The request was abandoned because the caller was cancelled
    #[error("Request interrupted: {0}")]
    Interrupted(String),

    /// The request did not complete within its wait budget
    #[error("Request timed out after {0:?}")]
    TimedOut(Duration),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Classify this error for retry decisions
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Interrupted(_) => ErrorKind::Cancelled,
            _ => ErrorKind::Transient,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }
}

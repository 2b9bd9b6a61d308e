//! Error types for monitoring sessions

use dagmon_client::{ClientError, ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while observing a DAG
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The caller's context signalled that the session must stop
    #[error("Monitoring cancelled: {0}")]
    Cancelled(String),

    /// A status request did not complete within its wait budget
    #[error("Status request exceeded its {0:?} budget")]
    PollTimeout(Duration),

    /// The job handle reported an error
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl MonitorError {
    /// Classify this error for the failure window
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::PollTimeout(_) => ErrorKind::Transient,
            Self::Client(err) => err.kind(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

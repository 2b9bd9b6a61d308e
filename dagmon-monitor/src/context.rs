//! Caller context probes
//!
//! The code that starts a monitoring session usually has its own reasons to
//! stop early: a lost heartbeat, a released lock, a user interrupt. The
//! monitor asks a [`CancellationProbe`] once per poll and aborts the session
//! (killing the DAG) when the probe reports a failure.

use tokio_util::sync::CancellationToken;

use crate::error::MonitorError;

/// Out-of-band stop signal checked before every poll
pub trait CancellationProbe: Send + Sync {
    /// Returns an error when the session must stop
    fn check(&self) -> Result<(), MonitorError>;
}

impl CancellationProbe for CancellationToken {
    fn check(&self) -> Result<(), MonitorError> {
        if self.is_cancelled() {
            Err(MonitorError::Cancelled(
                "caller cancelled the session".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Adapts a closure into a [`CancellationProbe`]
///
/// The closure returns the reason the session has to stop, if any.
pub struct ProbeFn<F>(pub F);

impl<F> CancellationProbe for ProbeFn<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn check(&self) -> Result<(), MonitorError> {
        match (self.0)() {
            Some(reason) => Err(MonitorError::Cancelled(reason)),
            None => Ok(()),
        }
    }
}

//! Status poller
//!
//! Issues one status request with a bounded wait. A request still in flight
//! when the budget runs out is dropped and reported as a transient failure.

use dagmon_client::JobHandle;
use dagmon_core::domain::job::StatusSnapshot;
use dagmon_core::dto::job::StatusOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::MonitorError;

/// Fetches status snapshots from a job handle
pub struct StatusPoller {
    handle: Arc<dyn JobHandle>,
    options: StatusOptions,
}

impl StatusPoller {
    /// Creates a poller that asks for DAG counters on every request
    pub fn new(handle: Arc<dyn JobHandle>) -> Self {
        Self::with_options(handle, StatusOptions::with_counters())
    }

    pub fn with_options(handle: Arc<dyn JobHandle>, options: StatusOptions) -> Self {
        Self { handle, options }
    }

    /// Fetches one snapshot, waiting at most `budget`
    pub async fn poll(&self, budget: Duration) -> Result<StatusSnapshot, MonitorError> {
        debug!(
            "Polling DAG {} (budget: {:?})",
            self.handle.job_id(),
            budget
        );

        match tokio::time::timeout(budget, self.handle.fetch_status(&self.options, budget)).await {
            Ok(result) => result.map_err(MonitorError::from),
            Err(_) => Err(MonitorError::PollTimeout(budget)),
        }
    }
}

//! DAG status and control endpoints

use crate::DagClient;
use crate::error::{ClientError, Result};
use dagmon_core::domain::job::StatusSnapshot;
use dagmon_core::dto::job::{KillResponse, StatusOptions, StatusQuery};
use std::time::Duration;

/// Upper bound for a kill request
pub const KILL_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

impl DagClient {
    // =============================================================================
    // DAG Status
    // =============================================================================

    /// Fetch the current status of a DAG
    ///
    /// The service may hold the request open for half of `timeout` waiting for
    /// a state change, which leaves the other half for the response to arrive.
    /// A request that runs past `timeout` fails with [`ClientError::TimedOut`].
    ///
    /// # Arguments
    /// * `dag_id` - The DAG identifier
    /// * `options` - What the snapshot should include
    /// * `timeout` - Total wait budget for the request
    pub async fn get_dag_status(
        &self,
        dag_id: &str,
        options: &StatusOptions,
        timeout: Duration,
    ) -> Result<StatusSnapshot> {
        let url = format!("{}/api/dags/{}/status", self.base_url, dag_id);
        let query = StatusQuery::new(options, (timeout / 2).as_millis() as u64);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(dag_id.to_string()));
        }

        self.handle_response(response).await
    }

    // =============================================================================
    // DAG Control
    // =============================================================================

    /// Ask the service to kill a DAG
    ///
    /// Killing a DAG that already stopped is accepted by the service and
    /// reported with `accepted == false`. Gives up after
    /// [`KILL_REQUEST_TIMEOUT`].
    pub async fn kill_dag(&self, dag_id: &str) -> Result<KillResponse> {
        let url = format!("{}/api/dags/{}/kill", self.base_url, dag_id);
        let response = self
            .client
            .post(&url)
            .timeout(KILL_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| map_send_error(e, KILL_REQUEST_TIMEOUT))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(dag_id.to_string()));
        }

        self.handle_response(response).await
    }
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::TimedOut(timeout)
    } else {
        ClientError::RequestFailed(err)
    }
}

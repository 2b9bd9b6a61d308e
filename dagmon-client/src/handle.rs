//! Job handles
//!
//! A [`JobHandle`] is the monitor's only view of a remote DAG. It is owned by
//! whoever submitted the DAG and shared (never owned) by the monitor and the
//! shutdown registry.

use async_trait::async_trait;
use dagmon_core::domain::job::StatusSnapshot;
use dagmon_core::dto::job::StatusOptions;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::DagClient;
use crate::error::{ClientError, Result};

/// Reference to a remote DAG job
#[async_trait]
pub trait JobHandle: Send + Sync {
    /// Stable identifier of the DAG; used as the registry key
    fn job_id(&self) -> &str;

    /// Description of where the DAG executes, reported when it starts running
    fn execution_context(&self) -> String {
        format!("DAG id: {}", self.job_id())
    }

    /// Fetches a status snapshot, failing once `timeout` has elapsed
    async fn fetch_status(&self, options: &StatusOptions, timeout: Duration)
    -> Result<StatusSnapshot>;

    /// Asks the remote side to kill the DAG
    ///
    /// Killing a DAG that already reached a terminal state is a no-op.
    async fn request_kill(&self) -> Result<()>;
}

/// [`JobHandle`] backed by the HTTP status service
///
/// When built with a cancellation token, an in-flight status request is
/// abandoned as soon as the token fires and reported as
/// [`ClientError::Interrupted`]. Kill requests ignore the token so they can
/// still be delivered during shutdown.
#[derive(Debug, Clone)]
pub struct HttpJobHandle {
    client: DagClient,
    dag_id: String,
    cancellation: Option<CancellationToken>,
}

impl HttpJobHandle {
    pub fn new(client: DagClient, dag_id: impl Into<String>) -> Self {
        Self {
            client,
            dag_id: dag_id.into(),
            cancellation: None,
        }
    }

    /// Ties status requests to a cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

#[async_trait]
impl JobHandle for HttpJobHandle {
    fn job_id(&self) -> &str {
        &self.dag_id
    }

    fn execution_context(&self) -> String {
        format!("DAG id: {} @ {}", self.dag_id, self.client.base_url())
    }

    async fn fetch_status(
        &self,
        options: &StatusOptions,
        timeout: Duration,
    ) -> Result<StatusSnapshot> {
        let request = self.client.get_dag_status(&self.dag_id, options, timeout);

        let Some(token) = &self.cancellation else {
            return request.await;
        };

        if token.is_cancelled() {
            return Err(ClientError::Interrupted(format!(
                "status request for {} cancelled before sending",
                self.dag_id
            )));
        }

        tokio::select! {
            result = request => result,
            _ = token.cancelled() => Err(ClientError::Interrupted(format!(
                "status request for {} cancelled",
                self.dag_id
            ))),
        }
    }

    async fn request_kill(&self) -> Result<()> {
        let response = self.client.kill_dag(&self.dag_id).await?;
        if !response.accepted {
            debug!("DAG {} was already stopped", response.dag_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use dagmon_core::domain::job::LifecycleState;
    use dagmon_core::domain::progress::Progress;
    use dagmon_core::dto::job::{KillResponse, StatusQuery};
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the DAG service
    struct FakeDag {
        id: String,
        state: Mutex<LifecycleState>,
        delay: Duration,
        last_query: Mutex<Option<StatusQuery>>,
        kills: Mutex<u32>,
    }

    impl FakeDag {
        fn new(id: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                state: Mutex::new(LifecycleState::Running),
                delay,
                last_query: Mutex::new(None),
                kills: Mutex::new(0),
            })
        }
    }

    async fn status(
        State(dag): State<Arc<FakeDag>>,
        Path(id): Path<String>,
        Query(query): Query<StatusQuery>,
    ) -> std::result::Result<Json<StatusSnapshot>, StatusCode> {
        if id != dag.id {
            return Err(StatusCode::NOT_FOUND);
        }
        *dag.last_query.lock().unwrap() = Some(query);
        tokio::time::sleep(dag.delay).await;

        let state = *dag.state.lock().unwrap();
        Ok(Json(
            StatusSnapshot::new(state)
                .with_vertex("Map 1", Progress::new(8, 3))
                .with_counter("TaskCounter", "SPILLED_RECORDS", 12),
        ))
    }

    async fn kill(
        State(dag): State<Arc<FakeDag>>,
        Path(id): Path<String>,
    ) -> std::result::Result<Json<KillResponse>, StatusCode> {
        if id != dag.id {
            return Err(StatusCode::NOT_FOUND);
        }
        *dag.kills.lock().unwrap() += 1;

        let mut state = dag.state.lock().unwrap();
        let accepted = !state.is_terminal();
        *state = LifecycleState::Killed;
        Ok(Json(KillResponse {
            dag_id: id,
            accepted,
        }))
    }

    async fn spawn_service(dag: Arc<FakeDag>) -> DagClient {
        let app = Router::new()
            .route("/api/dags/{id}/status", get(status))
            .route("/api/dags/{id}/kill", post(kill))
            .with_state(dag);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        DagClient::new(format!("http://{}", addr))
    }

    #[tokio::test]
    async fn test_fetch_status() {
        let dag = FakeDag::new("dag_1", Duration::ZERO);
        let handle = HttpJobHandle::new(spawn_service(dag.clone()).await, "dag_1");

        let snapshot = handle
            .fetch_status(&StatusOptions::with_counters(), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(snapshot.state, LifecycleState::Running);
        assert_eq!(snapshot.vertex_progress["Map 1"].total_task_count, 8);
        assert_eq!(snapshot.dag_counters.find("TaskCounter", "SPILLED_RECORDS"), 12);

        let query = dag.last_query.lock().unwrap().clone().unwrap();
        assert!(query.counters);
        assert_eq!(query.wait_ms, 1000);
    }

    #[tokio::test]
    async fn test_unknown_dag_is_not_found() {
        let dag = FakeDag::new("dag_1", Duration::ZERO);
        let handle = HttpJobHandle::new(spawn_service(dag).await, "dag_2");

        let err = handle
            .fetch_status(&StatusOptions::default(), Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.kind(), crate::ErrorKind::Transient);
    }

    #[tokio::test]
    async fn test_slow_status_times_out() {
        let dag = FakeDag::new("dag_1", Duration::from_secs(5));
        let handle = HttpJobHandle::new(spawn_service(dag).await, "dag_1");

        let err = handle
            .fetch_status(&StatusOptions::default(), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::TimedOut(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Transient);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_request() {
        let dag = FakeDag::new("dag_1", Duration::from_secs(5));
        let token = CancellationToken::new();
        let handle =
            HttpJobHandle::new(spawn_service(dag).await, "dag_1").with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = handle
            .fetch_status(&StatusOptions::default(), Duration::from_secs(10))
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, ClientError::Interrupted(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_kill_is_idempotent() {
        let dag = FakeDag::new("dag_1", Duration::ZERO);
        let handle = HttpJobHandle::new(spawn_service(dag.clone()).await, "dag_1");

        handle.request_kill().await.unwrap();
        handle.request_kill().await.unwrap();

        assert_eq!(*dag.kills.lock().unwrap(), 2);
        assert_eq!(*dag.state.lock().unwrap(), LifecycleState::Killed);
    }
}

//! Test doubles shared by the unit tests

use async_trait::async_trait;
use dagmon_client::{ClientError, JobHandle};
use dagmon_core::domain::job::{LifecycleState, StatusSnapshot};
use dagmon_core::domain::progress::Progress;
use dagmon_core::dto::job::StatusOptions;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::MonitorError;
use crate::service::{CounterValues, MonitorObserver};

/// One scripted answer to a status request
pub enum Step {
    /// Return this snapshot
    Status(StatusSnapshot),
    /// Fail with this error after `after` has elapsed
    Fail { after: Duration, error: ClientError },
    /// Never answer
    Hang,
}

impl Step {
    pub fn state(state: LifecycleState) -> Self {
        Self::Status(StatusSnapshot::new(state))
    }

    pub fn fail(error: ClientError) -> Self {
        Self::Fail {
            after: Duration::ZERO,
            error,
        }
    }

    pub fn fail_after(after: Duration) -> Self {
        Self::Fail {
            after,
            error: ClientError::api_error(503, "application master unavailable"),
        }
    }
}

/// Job handle answering status requests from a script
pub struct ScriptedHandle {
    id: String,
    steps: Mutex<VecDeque<Step>>,
    budgets: Mutex<Vec<Duration>>,
    kills: AtomicU32,
    fail_kills: AtomicBool,
    hang_kills: AtomicBool,
}

impl ScriptedHandle {
    pub fn new(id: &str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            steps: Mutex::new(steps.into()),
            budgets: Mutex::new(Vec::new()),
            kills: AtomicU32::new(0),
            fail_kills: AtomicBool::new(false),
            hang_kills: AtomicBool::new(false),
        })
    }

    pub fn failing_kills(self: Arc<Self>) -> Arc<Self> {
        self.fail_kills.store(true, Ordering::SeqCst);
        self
    }

    /// Kill requests are counted but never answered
    pub fn hanging_kills(self: Arc<Self>) -> Arc<Self> {
        self.hang_kills.store(true, Ordering::SeqCst);
        self
    }

    pub fn kill_count(&self) -> u32 {
        self.kills.load(Ordering::SeqCst)
    }

    /// Wait budgets of every status request, in order
    pub fn budgets(&self) -> Vec<Duration> {
        self.budgets.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.budgets.lock().unwrap().len()
    }
}

#[async_trait]
impl JobHandle for ScriptedHandle {
    fn job_id(&self) -> &str {
        &self.id
    }

    async fn fetch_status(
        &self,
        _options: &StatusOptions,
        timeout: Duration,
    ) -> dagmon_client::Result<StatusSnapshot> {
        self.budgets.lock().unwrap().push(timeout);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Status(snapshot)) => Ok(snapshot),
            Some(Step::Fail { after, error }) => {
                tokio::time::sleep(after).await;
                Err(error)
            }
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ClientError::ParseError("script exhausted".to_string())),
        }
    }

    async fn request_kill(&self) -> dagmon_client::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        if self.hang_kills.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_kills.load(Ordering::SeqCst) {
            return Err(ClientError::api_error(500, "kill rejected"));
        }
        Ok(())
    }
}

/// Observer recording every callback
#[derive(Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<LifecycleState>>,
    progress: Mutex<Vec<(LifecycleState, usize)>>,
    counters: Mutex<Vec<CounterValues>>,
    retries: AtomicU32,
    completed: AtomicBool,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<LifecycleState> {
        self.states.lock().unwrap().clone()
    }

    pub fn progress_count(&self) -> usize {
        self.progress.lock().unwrap().len()
    }

    /// State of each progress tick
    pub fn progress_states(&self) -> Vec<LifecycleState> {
        self.progress.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn counters(&self) -> Vec<CounterValues> {
        self.counters.lock().unwrap().clone()
    }

    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

impl MonitorObserver for RecordingObserver {
    fn on_state_change(&self, _previous: Option<LifecycleState>, state: LifecycleState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_progress(&self, snapshot: &StatusSnapshot, vertex_progress: &HashMap<String, Progress>) {
        self.progress
            .lock()
            .unwrap()
            .push((snapshot.state, vertex_progress.len()));
    }

    fn on_counters(&self, counters: &CounterValues) {
        self.counters.lock().unwrap().push(counters.clone());
    }

    fn on_retry(&self, _error: &MonitorError, _consecutive_failures: u32) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    fn on_session_complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }
}

//! DAG monitor
//!
//! Drives one monitoring session: polls the DAG until it reaches a terminal
//! state or the failure policy gives up, publishing progress and counters on
//! the way and killing the DAG when the session is aborted.
//!
//! The handle stays registered with the shutdown registry for exactly as long
//! as [`DagMonitor::run`] executes, whatever way it ends.

use dagmon_client::{JobHandle, KILL_REQUEST_TIMEOUT};
use dagmon_core::domain::job::StatusSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::context::CancellationProbe;
use crate::error::MonitorError;
use crate::outcome::{MonitorOutcome, ResultCode};
use crate::scheduler::poller::StatusPoller;
use crate::scheduler::transition::StateTransitionHandler;
use crate::service::{
    CounterExtractor, Decision, DiagnosticsBuffer, FailureWindow, MonitorObserver, NoopObserver,
    Registration, ShutdownRegistry, SubscribedCounters,
};

/// Monitors a single remote DAG
pub struct DagMonitor {
    session_id: Uuid,
    handle: Arc<dyn JobHandle>,
    registry: ShutdownRegistry,
    config: MonitorConfig,
    extractor: CounterExtractor,
    probe: Option<Arc<dyn CancellationProbe>>,
    observer: Arc<dyn MonitorObserver>,
}

impl DagMonitor {
    /// Creates a monitor with no counter subscription, no cancellation probe
    /// and no observer
    ///
    /// Fails when `config` does not pass [`MonitorConfig::validate`].
    pub fn new(
        handle: Arc<dyn JobHandle>,
        registry: ShutdownRegistry,
        config: MonitorConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            session_id: Uuid::new_v4(),
            handle,
            registry,
            config,
            extractor: CounterExtractor::new(SubscribedCounters::default()),
            probe: None,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Counters to extract and publish on every poll
    pub fn with_counters(mut self, subscribed: SubscribedCounters) -> Self {
        self.extractor = CounterExtractor::new(subscribed);
        self
    }

    /// Caller-side stop signal checked before every poll
    pub fn with_probe(mut self, probe: Arc<dyn CancellationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MonitorObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Runs the session to completion
    pub async fn run(self) -> MonitorOutcome {
        let registration = self.registry.register(Arc::clone(&self.handle));
        let poller = StatusPoller::new(Arc::clone(&self.handle));
        let mut window = FailureWindow::from_config(&self.config);
        let mut transitions = StateTransitionHandler::new(Instant::now());
        let mut diagnostics = DiagnosticsBuffer::new();

        let mut interval = self.config.min_poll_interval;
        let mut last_status: Option<StatusSnapshot> = None;
        let mut result = ResultCode::Success;
        let mut retries = 0u32;
        let mut kill_requested = false;

        info!(
            "Monitoring DAG {} (session {})",
            self.handle.job_id(),
            self.session_id
        );

        loop {
            let tick = Instant::now();
            let mut done = false;

            match self.poll_once(&poller, interval).await {
                Ok(snapshot) => {
                    window.on_success();

                    if self.extractor.is_active() {
                        let counters = self.extractor.extract(
                            &snapshot.dag_counters,
                            &snapshot.vertex_progress,
                            snapshot.state.is_terminal(),
                            transitions.clock(),
                        );
                        self.observer.on_counters(&counters);
                    }

                    let effects =
                        transitions.observe(&snapshot, self.observer.as_ref(), || {
                            self.handle.execution_context()
                        });

                    if effects.entered_running {
                        // The DAG only honours interrupts once it runs
                        interval = self.config.max_poll_interval;
                    }
                    if let Some(code) = effects.finished {
                        result = code;
                        done = true;
                    }

                    last_status = Some(snapshot);
                }
                Err(err) => {
                    warn!("Failed to fetch status of DAG {}: {}", self.handle.job_id(), err);

                    match window.on_failure(&err) {
                        Decision::Retry => {
                            retries += 1;
                            info!(
                                "Retrying... ({} consecutive failure(s))",
                                window.consecutive_failures()
                            );
                            self.observer
                                .on_retry(&err, window.consecutive_failures());
                        }
                        Decision::Abort => {
                            kill_requested = self.abort(&err, &window, &registration).await;
                            diagnostics.append(&format!(
                                "Execution has failed: {:#}",
                                anyhow::Error::from(err)
                            ));
                            result = ResultCode::Killed;
                            done = true;
                        }
                    }
                }
            }

            if done {
                if !result.is_success() {
                    if let Some(status) = &last_status {
                        for diagnostic in &status.diagnostics {
                            error!("{}", diagnostic);
                        }
                        diagnostics.extend(&status.diagnostics);
                    }
                }
                self.observer.on_session_complete();
                break;
            }

            time::sleep_until(tick + interval).await;
        }

        drop(registration);
        let milestones = transitions.finish();

        info!(
            "DAG {} monitoring finished with result code {}",
            self.handle.job_id(),
            result
        );

        let outcome = MonitorOutcome {
            session_id: self.session_id,
            result_code: result,
            final_status: last_status,
            diagnostics: diagnostics.into_string(),
            milestones,
            retries,
            kill_requested,
        };

        if self.config.profiling_enabled {
            if let Some(summary) = outcome.summary_line() {
                info!("{}", summary);
            }
        }

        outcome
    }

    /// Checks the caller context, then fetches one snapshot
    async fn poll_once(
        &self,
        poller: &StatusPoller,
        budget: Duration,
    ) -> Result<StatusSnapshot, MonitorError> {
        if let Some(probe) = &self.probe {
            probe.check()?;
        }
        poller.poll(budget).await
    }

    /// Best-effort kill after the failure policy gave up
    ///
    /// Skipped when the shutdown hook already killed the DAG. The request is
    /// bounded so an unresponsive service cannot hold the session open.
    /// Returns whether this session sent the kill.
    async fn abort(
        &self,
        err: &MonitorError,
        window: &FailureWindow,
        registration: &Registration,
    ) -> bool {
        if !registration.claim_kill() {
            info!("DAG {} was already killed on shutdown", self.handle.job_id());
            return false;
        }

        if err.is_cancellation() {
            info!("Killing DAG {}...", self.handle.job_id());
        } else {
            info!(
                "Killing DAG {}... after {} seconds",
                self.handle.job_id(),
                window.elapsed().as_secs()
            );
        }

        match time::timeout(KILL_REQUEST_TIMEOUT, self.handle.request_kill()).await {
            Ok(Ok(())) => debug!("Kill requested for DAG {}", self.handle.job_id()),
            Ok(Err(e)) => warn!("Failed to kill DAG {}: {}", self.handle.job_id(), e),
            Err(_) => warn!("Kill request for DAG {} timed out", self.handle.job_id()),
        }
        true
    }
}

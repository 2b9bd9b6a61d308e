//! State transition handling
//!
//! Maps every fetched lifecycle state to its side effects. A state fires when
//! it differs from the last observed one, and RUNNING fires on every poll so
//! progress keeps flowing while the DAG runs.

use chrono::Utc;
use dagmon_core::domain::job::{LifecycleState, StatusSnapshot};
use tokio::time::Instant;
use tracing::{error, info};

use crate::outcome::{Milestones, ResultCode};
use crate::service::{MonitorObserver, SessionClock};

/// Effects of one observed state the monitor loop has to act on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionEffects {
    /// Whether any side effect fired for this state
    pub fired: bool,
    /// First time the DAG was seen RUNNING; the poll interval widens
    pub entered_running: bool,
    /// Set once a terminal state has been reached
    pub finished: Option<ResultCode>,
}

/// Tracks the last observed state and the timing milestones of a session
#[derive(Debug, Clone)]
pub struct StateTransitionHandler {
    last_state: Option<LifecycleState>,
    running: bool,
    clock: SessionClock,
    milestones: Milestones,
}

impl StateTransitionHandler {
    pub fn new(monitor_started: Instant) -> Self {
        Self {
            last_state: None,
            running: false,
            clock: SessionClock::new(monitor_started),
            milestones: Milestones::new(Utc::now()),
        }
    }

    pub fn last_state(&self) -> Option<LifecycleState> {
        self.last_state
    }

    /// Clock readings for time-based counters
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn milestones(&self) -> &Milestones {
        &self.milestones
    }

    /// Applies the side effects of a freshly fetched snapshot
    ///
    /// `execution_context` is only evaluated when the DAG enters RUNNING.
    pub fn observe(
        &mut self,
        snapshot: &StatusSnapshot,
        observer: &dyn MonitorObserver,
        execution_context: impl FnOnce() -> String,
    ) -> TransitionEffects {
        let state = snapshot.state;
        let mut effects = TransitionEffects::default();

        if self.last_state == Some(state) && state != LifecycleState::Running {
            return effects;
        }

        effects.fired = true;
        let previous = self.last_state.replace(state);
        if previous != Some(state) {
            observer.on_state_change(previous, state);
        }

        match state {
            LifecycleState::Submitted => {
                info!("Status: Submitted");
            }
            LifecycleState::Initing => {
                info!("Status: Initializing");
                self.mark_execution_start();
                if self.milestones.initing_at.is_none() {
                    self.milestones.initing_at = Some(Utc::now());
                }
                observer.on_progress(snapshot, &snapshot.vertex_progress);
            }
            LifecycleState::Running => {
                if !self.running {
                    self.running = true;
                    effects.entered_running = true;
                    self.mark_execution_start();

                    let now = Utc::now();
                    self.milestones.running_at = Some(now);
                    self.milestones.submit_to_running =
                        Some(self.clock.monitor_started.elapsed());
                    info!("Status: Running ({})", execution_context());
                }
                observer.on_progress(snapshot, &snapshot.vertex_progress);
            }
            LifecycleState::Succeeded => {
                self.finish_execution();
                observer.on_progress(snapshot, &snapshot.vertex_progress);
                info!("Status: Succeeded");
                effects.finished = Some(ResultCode::Success);
            }
            LifecycleState::Killed => {
                self.finish_execution();
                observer.on_progress(snapshot, &snapshot.vertex_progress);
                info!("Status: Killed");
                effects.finished = Some(ResultCode::Killed);
            }
            LifecycleState::Failed | LifecycleState::Error => {
                self.finish_execution();
                observer.on_progress(snapshot, &snapshot.vertex_progress);
                error!("Status: Failed ({})", state);
                effects.finished = Some(ResultCode::Failed);
            }
        }

        effects
    }

    /// Stamps the end of monitoring and returns the milestones
    pub fn finish(mut self) -> Milestones {
        self.milestones.finished_at = Some(Utc::now());
        self.milestones
    }

    fn mark_execution_start(&mut self) {
        self.clock.execution_started = Some(Instant::now());
        self.milestones.execution_started = Some(Utc::now());
    }

    /// Execution durations are measured from the monitor start when the DAG
    /// was never seen running
    fn finish_execution(&mut self) {
        if !self.running {
            self.clock.execution_started = Some(self.clock.monitor_started);
            self.milestones.execution_started = Some(self.milestones.monitor_started);
        }
        self.running = false;
    }
}

//! Failure window
//!
//! Decides whether a failed poll is retried or aborts the session.
//!
//! A cancellation-class error aborts at once. Transient errors abort only
//! when the current run of consecutive failures is both long enough (count)
//! and old enough (time), so one slow poll never kills a healthy DAG while
//! sustained failure still has a bounded cost.

use dagmon_client::ErrorKind;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// What to do after a failed poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry,
    Abort,
}

/// The current run of consecutive failures
///
/// `window_start` is set exactly when `consecutive_failures` goes from 0 to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureRun {
    pub consecutive_failures: u32,
    pub window_start: Option<Instant>,
}

/// Retry policy over consecutive poll failures
#[derive(Debug, Clone)]
pub struct FailureWindow {
    max_failures: u32,
    max_window: Duration,
    run: FailureRun,
}

impl FailureWindow {
    pub fn new(max_failures: u32, max_window: Duration) -> Self {
        Self {
            max_failures,
            max_window,
            run: FailureRun::default(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.max_retry_failures(), config.max_retry_window)
    }

    /// Records a successful poll; the remote side is treated as recovered
    pub fn on_success(&mut self) {
        self.run = FailureRun::default();
    }

    /// Records a failed poll and decides whether to keep polling
    pub fn on_failure(&mut self, error: &MonitorError) -> Decision {
        self.record(error.kind(), Instant::now())
    }

    pub(crate) fn record(&mut self, kind: ErrorKind, now: Instant) -> Decision {
        if self.run.consecutive_failures == 0 {
            self.run.window_start = Some(now);
        }
        self.run.consecutive_failures = self.run.consecutive_failures.saturating_add(1);

        if kind == ErrorKind::Cancelled {
            return Decision::Abort;
        }

        if self.run.consecutive_failures >= self.max_failures && self.elapsed_at(now) > self.max_window
        {
            Decision::Abort
        } else {
            Decision::Retry
        }
    }

    pub fn run(&self) -> FailureRun {
        self.run
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.run.consecutive_failures
    }

    /// Time since the first failure of the current run
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        self.run
            .window_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}

//! Monitor observers
//!
//! Observers are the output side of a monitoring session: console renderers,
//! workload policies, metrics sinks. Every method has a no-op default so an
//! observer only implements what it consumes.

use dagmon_core::domain::job::{LifecycleState, StatusSnapshot};
use dagmon_core::domain::progress::Progress;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MonitorError;
use crate::service::CounterValues;

/// Receives updates from a monitoring session
pub trait MonitorObserver: Send + Sync {
    /// The DAG was seen in a new state
    fn on_state_change(&self, _previous: Option<LifecycleState>, _state: LifecycleState) {}

    /// Progress tick: fired on every RUNNING poll, and on entry to any other
    /// state that has vertex progress to report
    fn on_progress(&self, _snapshot: &StatusSnapshot, _vertex_progress: &HashMap<String, Progress>) {
    }

    /// Fresh values for the subscribed counters
    fn on_counters(&self, _counters: &CounterValues) {}

    /// A failed poll will be retried
    fn on_retry(&self, _error: &MonitorError, _consecutive_failures: u32) {}

    /// The session is over; no more callbacks follow
    fn on_session_complete(&self) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MonitorObserver for NoopObserver {}

/// Fans updates out to several observers in order
#[derive(Clone, Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn MonitorObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn MonitorObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl MonitorObserver for CompositeObserver {
    fn on_state_change(&self, previous: Option<LifecycleState>, state: LifecycleState) {
        for observer in &self.observers {
            observer.on_state_change(previous, state);
        }
    }

    fn on_progress(&self, snapshot: &StatusSnapshot, vertex_progress: &HashMap<String, Progress>) {
        for observer in &self.observers {
            observer.on_progress(snapshot, vertex_progress);
        }
    }

    fn on_counters(&self, counters: &CounterValues) {
        for observer in &self.observers {
            observer.on_counters(counters);
        }
    }

    fn on_retry(&self, error: &MonitorError, consecutive_failures: u32) {
        for observer in &self.observers {
            observer.on_retry(error, consecutive_failures);
        }
    }

    fn on_session_complete(&self) {
        for observer in &self.observers {
            observer.on_session_complete();
        }
    }
}

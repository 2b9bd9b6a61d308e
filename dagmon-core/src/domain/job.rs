//! DAG job domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::counters::CounterSet;
use crate::domain::progress::Progress;

/// Lifecycle state of a remote DAG job
///
/// States are not strictly ordered: `Running` is reported on every poll while
/// the job makes progress, so it doubles as a tick signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Submitted,
    Initing,
    Running,
    Succeeded,
    Killed,
    Failed,
    Error,
}

impl LifecycleState {
    /// Whether the job has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Killed | Self::Failed | Self::Error
        )
    }

    /// Whether the job stopped because of a job-side failure
    ///
    /// `Failed` and `Error` are treated identically by the monitor.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Initing => "INITING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Killed => "KILLED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a DAG job at one point in time
///
/// A fresh snapshot is fetched on every poll; snapshots are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: LifecycleState,
    #[serde(default)]
    pub dag_counters: CounterSet,
    #[serde(default)]
    pub vertex_progress: HashMap<String, Progress>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl StatusSnapshot {
    /// Creates a snapshot with no counters, progress or diagnostics
    pub fn new(state: LifecycleState) -> Self {
        Self {
            state,
            dag_counters: CounterSet::default(),
            vertex_progress: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_vertex(mut self, name: impl Into<String>, progress: Progress) -> Self {
        self.vertex_progress.insert(name.into(), progress);
        self
    }

    pub fn with_counter(mut self, group: &str, name: &str, value: i64) -> Self {
        self.dag_counters.insert(group, name, value);
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostics.push(diagnostic.into());
        self
    }

    /// Overall completion across all vertices, between 0.0 and 1.0
    pub fn completion(&self) -> f64 {
        let (total, succeeded) = self
            .vertex_progress
            .values()
            .fold((0i64, 0i64), |(total, succeeded), p| {
                (total + p.total_task_count, succeeded + p.succeeded_task_count)
            });

        if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LifecycleState::Submitted.is_terminal());
        assert!(!LifecycleState::Initing.is_terminal());
        assert!(!LifecycleState::Running.is_terminal());
        assert!(LifecycleState::Succeeded.is_terminal());
        assert!(LifecycleState::Killed.is_terminal());
        assert!(LifecycleState::Failed.is_terminal());
        assert!(LifecycleState::Error.is_terminal());
    }

    #[test]
    fn test_failure_states() {
        assert!(LifecycleState::Failed.is_failure());
        assert!(LifecycleState::Error.is_failure());
        assert!(!LifecycleState::Killed.is_failure());
        assert!(!LifecycleState::Succeeded.is_failure());
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_fields() {
        let snapshot: StatusSnapshot = serde_json::from_str(r#"{"state":"INITING"}"#).unwrap();
        assert_eq!(snapshot.state, LifecycleState::Initing);
        assert!(snapshot.vertex_progress.is_empty());
        assert!(snapshot.diagnostics.is_empty());
    }

    #[test]
    fn test_completion() {
        let snapshot = StatusSnapshot::new(LifecycleState::Running)
            .with_vertex("Map 1", Progress::new(10, 5))
            .with_vertex("Reducer 2", Progress::new(10, 0));
        assert!((snapshot.completion() - 0.25).abs() < f64::EPSILON);

        let empty = StatusSnapshot::new(LifecycleState::Submitted);
        assert_eq!(empty.completion(), 0.0);
    }
}

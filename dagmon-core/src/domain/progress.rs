//! Vertex progress

use serde::{Deserialize, Serialize};

/// Task-level progress of a single DAG vertex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub total_task_count: i64,
    pub succeeded_task_count: i64,
    pub running_task_count: i64,
    pub failed_task_count: i64,
    pub killed_task_count: i64,
    pub failed_task_attempt_count: i64,
    pub killed_task_attempt_count: i64,
}

impl Progress {
    pub fn new(total_task_count: i64, succeeded_task_count: i64) -> Self {
        Self {
            total_task_count,
            succeeded_task_count,
            ..Self::default()
        }
    }

    /// Tasks neither finished nor running
    pub fn pending_task_count(&self) -> i64 {
        (self.total_task_count - self.succeeded_task_count - self.running_task_count).max(0)
    }

    pub fn is_complete(&self) -> bool {
        self.total_task_count > 0 && self.succeeded_task_count >= self.total_task_count
    }
}

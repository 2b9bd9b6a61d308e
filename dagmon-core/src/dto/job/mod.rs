//! DAG job DTOs for the status service

use serde::{Deserialize, Serialize};

/// Options for a status request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOptions {
    /// Ask the service to include DAG counters in the snapshot
    pub counters: bool,
}

impl StatusOptions {
    pub fn with_counters() -> Self {
        Self { counters: true }
    }
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self::with_counters()
    }
}

/// Query string of a status request
///
/// `wait_ms` lets the service hold the request open until the status changes
/// or the wait expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusQuery {
    pub counters: bool,
    pub wait_ms: u64,
}

impl StatusQuery {
    pub fn new(options: &StatusOptions, wait_ms: u64) -> Self {
        Self {
            counters: options.counters,
            wait_ms,
        }
    }
}

/// Response body of a kill request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillResponse {
    pub dag_id: String,
    /// False when the DAG had already stopped
    pub accepted: bool,
}

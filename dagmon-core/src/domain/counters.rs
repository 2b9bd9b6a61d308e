//! Counter domain types
//!
//! A DAG reports its counters grouped by source (file system, task, custom
//! groups...). Policy components subscribe to counters by name only, so the
//! names listed in [`WellKnownCounter`] form a shared vocabulary between the
//! policy side and the extractor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Grouped named counters: group -> counter name -> value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterSet {
    groups: BTreeMap<String, BTreeMap<String, i64>>,
}

impl CounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a counter value, replacing any previous value in the same group
    pub fn insert(&mut self, group: &str, name: &str, value: i64) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Looks up a counter, returning 0 when the group or counter is missing
    pub fn find(&self, group: &str, name: &str) -> i64 {
        self.groups
            .get(group)
            .and_then(|counters| counters.get(name))
            .copied()
            .unwrap_or(0)
    }

    /// Iterates over `(group, name, value)` in group order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.groups.iter().flat_map(|(group, counters)| {
            counters
                .iter()
                .map(move |(name, value)| (group.as_str(), name.as_str(), *value))
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }
}

/// Counters that are computed by the monitor instead of copied from the DAG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownCounter {
    /// Maximum total task count across all vertices
    TotalTasks,
    /// Milliseconds since monitoring began
    ElapsedTime,
    /// Milliseconds since the job started executing
    ExecutionTime,
}

impl WellKnownCounter {
    pub const ALL: [WellKnownCounter; 3] = [
        WellKnownCounter::TotalTasks,
        WellKnownCounter::ElapsedTime,
        WellKnownCounter::ExecutionTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalTasks => "TOTAL_TASKS",
            Self::ElapsedTime => "ELAPSED_TIME",
            Self::ExecutionTime => "EXECUTION_TIME",
        }
    }

    /// Whether the value is derived from the wall clock
    pub fn is_time_based(&self) -> bool {
        matches!(self, Self::ElapsedTime | Self::ExecutionTime)
    }
}

impl fmt::Display for WellKnownCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WellKnownCounter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|counter| counter.as_str() == s)
            .ok_or_else(|| format!("Unknown counter: {}", s))
    }
}

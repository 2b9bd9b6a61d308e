//! Counter extraction
//!
//! Turns a raw status snapshot into the flat `name -> value` map a policy
//! component subscribed to. Three kinds of counters are produced:
//! - direct counters copied from the DAG counter groups
//! - `TOTAL_TASKS`, the maximum total task count across vertices
//! - `ELAPSED_TIME` and `EXECUTION_TIME`, computed from the session clock
//!   while the session is still running

use dagmon_core::domain::counters::{CounterSet, WellKnownCounter};
use dagmon_core::domain::progress::Progress;
use std::collections::{HashMap, HashSet};
use tokio::time::Instant;

/// Extracted counter values keyed by counter name
pub type CounterValues = HashMap<String, i64>;

/// Counter names a policy component wants to see
///
/// Fixed for the lifetime of one monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribedCounters {
    names: HashSet<String>,
}

impl SubscribedCounters {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds one of the computed counters to the subscription
    pub fn with(mut self, counter: WellKnownCounter) -> Self {
        self.names.insert(counter.as_str().to_string());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn contains_well_known(&self, counter: WellKnownCounter) -> bool {
        self.contains(counter.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Clock readings the time-based counters are computed from
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    /// When monitoring began
    pub monitor_started: Instant,
    /// When the DAG started executing, if it has
    pub execution_started: Option<Instant>,
}

impl SessionClock {
    pub fn new(monitor_started: Instant) -> Self {
        Self {
            monitor_started,
            execution_started: None,
        }
    }
}

/// Extracts subscribed counters from status snapshots
#[derive(Debug, Clone)]
pub struct CounterExtractor {
    subscribed: SubscribedCounters,
}

impl CounterExtractor {
    pub fn new(subscribed: SubscribedCounters) -> Self {
        Self { subscribed }
    }

    pub fn subscribed(&self) -> &SubscribedCounters {
        &self.subscribed
    }

    /// Whether there is anything to extract at all
    pub fn is_active(&self) -> bool {
        !self.subscribed.is_empty()
    }

    /// Extracts the subscribed counters from one snapshot
    ///
    /// Every value is computed from the arguments alone, so calling this more
    /// than once for the same poll yields the same map.
    pub fn extract(
        &self,
        counters: &CounterSet,
        vertex_progress: &HashMap<String, Progress>,
        is_session_done: bool,
        clock: &SessionClock,
    ) -> CounterValues {
        self.extract_at(
            counters,
            vertex_progress,
            is_session_done,
            clock,
            Instant::now(),
        )
    }

    pub(crate) fn extract_at(
        &self,
        counters: &CounterSet,
        vertex_progress: &HashMap<String, Progress>,
        is_session_done: bool,
        clock: &SessionClock,
        now: Instant,
    ) -> CounterValues {
        let mut values = CounterValues::new();

        // Group identity is dropped; a later group wins on duplicate names
        for (_, name, value) in counters.iter() {
            if self.subscribed.contains(name) {
                values.insert(name.to_string(), value);
            }
        }

        // Limits are checked per query, so only the largest vertex matters
        if self.subscribed.contains_well_known(WellKnownCounter::TotalTasks) {
            if let Some(max) = vertex_progress
                .values()
                .map(|progress| progress.total_task_count)
                .max()
            {
                values.insert(WellKnownCounter::TotalTasks.as_str().to_string(), max);
            }
        }

        if is_session_done {
            return values;
        }

        if self.subscribed.contains_well_known(WellKnownCounter::ElapsedTime) {
            values.insert(
                WellKnownCounter::ElapsedTime.as_str().to_string(),
                millis_since(clock.monitor_started, now),
            );
        }

        if self.subscribed.contains_well_known(WellKnownCounter::ExecutionTime) {
            if let Some(started) = clock.execution_started {
                values.insert(
                    WellKnownCounter::ExecutionTime.as_str().to_string(),
                    millis_since(started, now),
                );
            }
        }

        values
    }
}

fn millis_since(start: Instant, now: Instant) -> i64 {
    i64::try_from(now.saturating_duration_since(start).as_millis()).unwrap_or(i64::MAX)
}

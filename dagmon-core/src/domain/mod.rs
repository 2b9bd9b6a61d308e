//! Core domain types
//!
//! This module contains the structures describing a remote DAG job as seen
//! from the client side. They are produced by a job handle on every poll and
//! consumed by the monitor, the counter extractor and console renderers.

pub mod counters;
pub mod job;
pub mod progress;

//! Dagmon Monitor
//!
//! Client-side observation and control of a remote DAG job.
//!
//! Architecture:
//! - Configuration: poll cadence and failure policy
//! - Services: failure window, counter extraction, diagnostics, observers and
//!   the shutdown registry
//! - Scheduler: the status poller, state transition handling and the monitor
//!   loop tying them together
//!
//! A session polls the DAG until it reaches a terminal state, widening the
//! poll interval once the DAG runs. Transient poll failures are retried until
//! the failure window gives up, at which point the DAG is killed. Every
//! monitored DAG stays in the [`ShutdownRegistry`] while its session runs so
//! that a process shutdown can kill it.
//!
//! # Example
//!
//! ```no_run
//! use dagmon_client::{DagClient, HttpJobHandle};
//! use dagmon_monitor::{DagMonitor, MonitorConfig, ShutdownRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ShutdownRegistry::new();
//!     registry.start();
//!
//!     let handle = HttpJobHandle::new(DagClient::new("http://localhost:8080"), "dag_1");
//!     let outcome = DagMonitor::new(Arc::new(handle), registry.clone(), MonitorConfig::default())?
//!         .run()
//!         .await;
//!
//!     registry.stop();
//!     std::process::exit(outcome.code());
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod outcome;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::MonitorConfig;
pub use context::{CancellationProbe, ProbeFn};
pub use error::MonitorError;
pub use outcome::{Milestones, MonitorOutcome, ResultCode};
pub use scheduler::{DagMonitor, StateTransitionHandler, StatusPoller};
pub use service::{
    CounterExtractor, CounterValues, Decision, DiagnosticsBuffer, FailureWindow, MonitorObserver,
    NoopObserver, ShutdownRegistry, SubscribedCounters, shutdown_signal,
};

//! Service layer
//!
//! Services hold the policy pieces of a monitoring session. They are plain
//! values owned by one session, except for the shutdown registry which is
//! shared by every session in the process.

mod counters;
mod diagnostics;
mod failure_window;
mod observer;
mod registry;

pub use counters::{CounterExtractor, CounterValues, SessionClock, SubscribedCounters};
pub use diagnostics::DiagnosticsBuffer;
pub use failure_window::{Decision, FailureRun, FailureWindow};
pub use observer::{CompositeObserver, MonitorObserver, NoopObserver};
pub use registry::{Registration, ShutdownRegistry, shutdown_signal};

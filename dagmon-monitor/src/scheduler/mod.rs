//! Scheduler layer
//!
//! Drives a monitoring session: fetching snapshots with a bounded wait,
//! reacting to lifecycle transitions and deciding when the session ends.

pub mod monitor;
pub mod poller;
pub mod transition;

pub use monitor::DagMonitor;
pub use poller::StatusPoller;
pub use transition::{StateTransitionHandler, TransitionEffects};

//! Configuration module
//!
//! Handles CLI configuration and the monitor settings derived from it.

use anyhow::{Context, Result};
use dagmon_monitor::MonitorConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the status server
    pub server_url: String,
}

/// Command-line overrides for the monitor settings
#[derive(Debug, Clone, Default)]
pub struct MonitorOverrides {
    pub min_poll_ms: Option<u64>,
    pub max_poll_ms: Option<u64>,
    pub retry_window_ms: Option<u64>,
    pub profile: bool,
}

/// Builds the monitor configuration
///
/// Environment variables provide the base, flags win over them. The result
/// is validated when the monitor is built.
pub fn monitor_config(overrides: &MonitorOverrides) -> Result<MonitorConfig> {
    let config = MonitorConfig::from_env().context("Failed to read monitor settings")?;
    Ok(apply_overrides(config, overrides))
}

fn apply_overrides(mut config: MonitorConfig, overrides: &MonitorOverrides) -> MonitorConfig {
    if let Some(ms) = overrides.min_poll_ms {
        config.min_poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.max_poll_ms {
        config.max_poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.retry_window_ms {
        config.max_retry_window = Duration::from_millis(ms);
    }
    if overrides.profile {
        config = config.with_profiling(true);
    }
    config
}

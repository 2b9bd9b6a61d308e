//! Monitor configuration
//!
//! Defines the polling cadence and failure policy of a monitoring session.

use std::time::Duration;

/// Poll interval used until the DAG is first seen running
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Poll interval once the DAG is running
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// How long a run of failures may last before the session gives up
pub const DEFAULT_MAX_RETRY_WINDOW: Duration = Duration::from_millis(2500);

/// Monitor configuration
///
/// The remote side does not answer interrupts until the DAG is running, so
/// polling fast is only useful before that point.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Poll interval (and per-poll wait budget) before the DAG runs
    pub min_poll_interval: Duration,

    /// Poll interval (and per-poll wait budget) once the DAG runs
    pub max_poll_interval: Duration,

    /// Minimum duration of a failure run before it can abort the session
    pub max_retry_window: Duration,

    /// Report execution timings when the DAG finishes
    pub profiling_enabled: bool,
}

impl MonitorConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
            max_retry_window: DEFAULT_MAX_RETRY_WINDOW,
            profiling_enabled: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - DAGMON_MIN_POLL_INTERVAL_MS (default: 200)
    /// - DAGMON_MAX_POLL_INTERVAL_MS (default: 1000)
    /// - DAGMON_MAX_RETRY_WINDOW_MS (default: 2500)
    /// - DAGMON_PROFILING (true/false/1/0, default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();

        if let Some(ms) = env_millis("DAGMON_MIN_POLL_INTERVAL_MS")? {
            config.min_poll_interval = ms;
        }

        if let Some(ms) = env_millis("DAGMON_MAX_POLL_INTERVAL_MS")? {
            config.max_poll_interval = ms;
        }

        if let Some(ms) = env_millis("DAGMON_MAX_RETRY_WINDOW_MS")? {
            config.max_retry_window = ms;
        }

        if let Ok(value) = std::env::var("DAGMON_PROFILING") {
            config.profiling_enabled = parse_flag(&value)
                .ok_or_else(|| anyhow::anyhow!("DAGMON_PROFILING must be true or false"))?;
        }

        Ok(config)
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling_enabled = enabled;
        self
    }

    /// Number of consecutive failures that, together with an expired retry
    /// window, aborts the session
    ///
    /// Derived so that a failure run spanning the retry window at the
    /// running poll cadence is always long enough to count.
    pub fn max_retry_failures(&self) -> u32 {
        let per_window = self.max_retry_window.as_millis() / self.max_poll_interval.as_millis().max(1);
        u32::try_from(per_window).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_poll_interval.is_zero() {
            anyhow::bail!("min_poll_interval must be greater than 0");
        }

        if self.max_poll_interval.is_zero() {
            anyhow::bail!("max_poll_interval must be greater than 0");
        }

        if self.min_poll_interval > self.max_poll_interval {
            anyhow::bail!("min_poll_interval cannot exceed max_poll_interval");
        }

        if self.max_retry_window.is_zero() {
            anyhow::bail!("max_retry_window must be greater than 0");
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_millis(name: &str) -> anyhow::Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(value) => {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("{} must be a number of milliseconds", name))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! Session results

use chrono::{DateTime, Utc};
use dagmon_core::domain::job::StatusSnapshot;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Final result code of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// The DAG succeeded
    Success,
    /// The DAG was killed, or the session gave up and killed it
    Killed,
    /// The DAG reported FAILED or ERROR
    Failed,
}

impl ResultCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Killed => 1,
            Self::Failed => 2,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Wall-clock milestones of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestones {
    /// Monitoring began
    pub monitor_started: DateTime<Utc>,
    /// First time the DAG was seen INITING
    pub initing_at: Option<DateTime<Utc>>,
    /// First time the DAG was seen RUNNING
    pub running_at: Option<DateTime<Utc>>,
    /// Start of execution used for duration reporting; falls back to the
    /// monitor start when the DAG was never seen running
    pub execution_started: Option<DateTime<Utc>>,
    /// Monitoring ended
    pub finished_at: Option<DateTime<Utc>>,
    /// Time from monitor start to the first RUNNING observation
    pub submit_to_running: Option<Duration>,
}

impl Milestones {
    pub fn new(monitor_started: DateTime<Utc>) -> Self {
        Self {
            monitor_started,
            initing_at: None,
            running_at: None,
            execution_started: None,
            finished_at: None,
            submit_to_running: None,
        }
    }

    /// Time from execution start to the end of monitoring
    pub fn execution_duration(&self) -> Option<Duration> {
        let start = self.execution_started.unwrap_or(self.monitor_started);
        let end = self.finished_at?;
        (end - start).to_std().ok()
    }

    /// Time spent monitoring
    pub fn total_duration(&self) -> Option<Duration> {
        let end = self.finished_at?;
        (end - self.monitor_started).to_std().ok()
    }
}

/// Everything a finished session reports back
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    pub session_id: Uuid,
    pub result_code: ResultCode,
    /// Last snapshot successfully fetched, if any
    pub final_status: Option<StatusSnapshot>,
    /// Non-empty only for non-zero result codes
    pub diagnostics: String,
    pub milestones: Milestones,
    /// Failed polls that were retried
    pub retries: u32,
    /// Whether the session itself asked for the DAG to be killed
    pub kill_requested: bool,
}

impl MonitorOutcome {
    pub fn code(&self) -> i32 {
        self.result_code.code()
    }

    /// One-line execution summary, printed when profiling is enabled
    pub fn summary_line(&self) -> Option<String> {
        if !self.result_code.is_success() {
            return None;
        }
        let duration = self.milestones.execution_duration()?;
        Some(format!(
            "Status: DAG finished successfully in {:.2} seconds",
            duration.as_secs_f64()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn outcome(result_code: ResultCode, milestones: Milestones) -> MonitorOutcome {
        MonitorOutcome {
            session_id: Uuid::new_v4(),
            result_code,
            final_status: None,
            diagnostics: String::new(),
            milestones,
            retries: 0,
            kill_requested: false,
        }
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(ResultCode::Success.code(), 0);
        assert_eq!(ResultCode::Killed.code(), 1);
        assert_eq!(ResultCode::Failed.code(), 2);
        assert_eq!(ResultCode::Failed.to_string(), "2");
    }

    #[test]
    fn test_execution_duration_prefers_execution_start() {
        let start = Utc::now();
        let mut milestones = Milestones::new(start);
        milestones.execution_started = Some(start + TimeDelta::milliseconds(500));
        milestones.finished_at = Some(start + TimeDelta::milliseconds(2750));

        assert_eq!(
            milestones.execution_duration(),
            Some(Duration::from_millis(2250))
        );
        assert_eq!(milestones.total_duration(), Some(Duration::from_millis(2750)));
    }

    #[test]
    fn test_summary_line_only_on_success() {
        let start = Utc::now();
        let mut milestones = Milestones::new(start);
        milestones.finished_at = Some(start + TimeDelta::milliseconds(1500));

        let line = outcome(ResultCode::Success, milestones.clone()).summary_line();
        assert_eq!(
            line.as_deref(),
            Some("Status: DAG finished successfully in 1.50 seconds")
        );
        assert!(outcome(ResultCode::Failed, milestones).summary_line().is_none());
    }
}

//! Console rendering of monitoring sessions

use colored::*;
use dagmon_core::domain::job::{LifecycleState, StatusSnapshot};
use dagmon_core::domain::progress::Progress;
use dagmon_monitor::{CounterValues, MonitorError, MonitorObserver};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Prints session updates to stdout
///
/// Progress lines are only printed when they change, so a DAG stuck on the
/// same numbers does not flood the terminal.
#[derive(Default)]
pub struct ConsoleObserver {
    last_line: Mutex<Option<String>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonitorObserver for ConsoleObserver {
    fn on_state_change(&self, _previous: Option<LifecycleState>, state: LifecycleState) {
        println!("{} {}", "State:".bold(), colorize_state(state));
    }

    fn on_progress(&self, snapshot: &StatusSnapshot, vertex_progress: &HashMap<String, Progress>) {
        if vertex_progress.is_empty() {
            return;
        }

        let line = format_progress(vertex_progress);
        let mut last = self
            .last_line
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() == Some(line.as_str()) {
            return;
        }

        println!(
            "{} {}",
            format!("[{:>3.0}%]", snapshot.completion() * 100.0).dimmed(),
            line
        );
        *last = Some(line);
    }

    fn on_counters(&self, counters: &CounterValues) {
        if counters.is_empty() {
            return;
        }
        println!("  {}", format_counters(counters).dimmed());
    }

    fn on_retry(&self, error: &MonitorError, consecutive_failures: u32) {
        println!(
            "{} status request failed ({}), retrying [{}]",
            "!".yellow(),
            error,
            consecutive_failures
        );
    }
}

/// Print one snapshot in full
pub fn print_snapshot(dag_id: &str, snapshot: &StatusSnapshot) {
    println!("{}", "DAG Status:".bold());
    println!("  ID:       {}", dag_id.cyan());
    println!("  State:    {}", colorize_state(snapshot.state));
    println!("  Progress: {:.0}%", snapshot.completion() * 100.0);

    if !snapshot.vertex_progress.is_empty() {
        println!("\n{}", "Vertices:".bold());
        let mut names: Vec<&String> = snapshot.vertex_progress.keys().collect();
        names.sort();
        for name in names {
            let progress = &snapshot.vertex_progress[name];
            println!("  {}", format_vertex(name, progress));
        }
    }

    if !snapshot.dag_counters.is_empty() {
        println!("\n{}", "Counters:".bold());
        for (group, name, value) in snapshot.dag_counters.iter() {
            println!("  {} {} = {}", group.dimmed(), name.cyan(), value);
        }
    }

    if !snapshot.diagnostics.is_empty() {
        println!("\n{}", "Diagnostics:".bold());
        for diagnostic in &snapshot.diagnostics {
            println!("{}", diagnostic.red());
        }
    }
}

/// One progress line covering every vertex, in name order
pub fn format_progress(vertex_progress: &HashMap<String, Progress>) -> String {
    let mut names: Vec<&String> = vertex_progress.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| format_vertex(name, &vertex_progress[name]))
        .collect::<Vec<_>>()
        .join("  ")
}

/// `name: succeeded(+running,-failed)/total`, with zero running and failed
/// counts left out
pub fn format_vertex(name: &str, progress: &Progress) -> String {
    let mut active = Vec::new();
    if progress.running_task_count > 0 {
        active.push(format!("+{}", progress.running_task_count));
    }
    if progress.failed_task_count > 0 {
        active.push(format!("-{}", progress.failed_task_count));
    }

    if active.is_empty() {
        format!(
            "{}: {}/{}",
            name, progress.succeeded_task_count, progress.total_task_count
        )
    } else {
        format!(
            "{}: {}({})/{}",
            name,
            progress.succeeded_task_count,
            active.join(","),
            progress.total_task_count
        )
    }
}

fn format_counters(counters: &CounterValues) -> String {
    let mut entries: Vec<(&String, &i64)> = counters.iter().collect();
    entries.sort();
    entries
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn colorize_state(state: LifecycleState) -> ColoredString {
    let label = state.as_str();
    match state {
        LifecycleState::Submitted | LifecycleState::Initing => label.yellow(),
        LifecycleState::Running => label.cyan(),
        LifecycleState::Succeeded => label.green(),
        LifecycleState::Killed => label.dimmed(),
        LifecycleState::Failed | LifecycleState::Error => label.red(),
    }
}

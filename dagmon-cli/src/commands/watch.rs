//! Watch command
//!
//! Runs a monitoring session in the foreground. Ctrl-C kills the DAG through
//! the shutdown registry and cancels in-flight status requests.

use anyhow::Result;
use clap::Args;
use colored::*;
use dagmon_client::{DagClient, HttpJobHandle};
use dagmon_core::domain::counters::WellKnownCounter;
use dagmon_monitor::{
    DagMonitor, MonitorOutcome, ResultCode, ShutdownRegistry, SubscribedCounters,
    shutdown_signal,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, MonitorOverrides, monitor_config};
use crate::render::ConsoleObserver;

/// Arguments of `dagmon watch`
#[derive(Args)]
pub struct WatchArgs {
    /// DAG id
    pub dag_id: String,

    /// Counter to report on every poll (repeatable)
    #[arg(long = "counter", value_name = "NAME")]
    pub counters: Vec<String>,

    /// Poll interval before the DAG runs
    #[arg(long)]
    pub min_poll_ms: Option<u64>,

    /// Poll interval once the DAG runs
    #[arg(long)]
    pub max_poll_ms: Option<u64>,

    /// How long poll failures may last before the DAG is killed
    #[arg(long)]
    pub retry_window_ms: Option<u64>,

    /// Print execution timings when the DAG finishes
    #[arg(long)]
    pub profile: bool,
}

impl WatchArgs {
    fn overrides(&self) -> MonitorOverrides {
        MonitorOverrides {
            min_poll_ms: self.min_poll_ms,
            max_poll_ms: self.max_poll_ms,
            retry_window_ms: self.retry_window_ms,
            profile: self.profile,
        }
    }
}

pub async fn handle_watch(args: WatchArgs, config: &Config) -> Result<i32> {
    let monitor_config = monitor_config(&args.overrides())?;
    let subscribed = subscription(&args.counters);

    let cancel = CancellationToken::new();
    let handle = HttpJobHandle::new(DagClient::new(&config.server_url), args.dag_id.as_str())
        .with_cancellation(cancel.clone());

    let registry = ShutdownRegistry::new();
    let token = cancel.clone();
    registry.start_with(async move {
        shutdown_signal().await;
        token.cancel();
    });

    info!("Watching DAG {} on {}", args.dag_id, config.server_url);

    let outcome = DagMonitor::new(Arc::new(handle), registry.clone(), monitor_config)?
        .with_counters(subscribed)
        .with_probe(Arc::new(cancel))
        .with_observer(Arc::new(ConsoleObserver::new()))
        .run()
        .await;

    registry.stop();
    print_outcome(&args.dag_id, &outcome);

    Ok(outcome.code())
}

/// Builds the counter subscription, warning about names that look like
/// misspelled computed counters
fn subscription(names: &[String]) -> SubscribedCounters {
    for name in names {
        let upper = name.to_uppercase();
        if upper != *name && upper.parse::<WellKnownCounter>().is_ok() {
            warn!("Counter names are case sensitive; did you mean {}?", upper);
        }
    }
    SubscribedCounters::new(names.iter().cloned())
}

fn print_outcome(dag_id: &str, outcome: &MonitorOutcome) {
    println!();
    let status = match outcome.result_code {
        ResultCode::Success => "succeeded".green(),
        ResultCode::Killed if outcome.kill_requested => "killed by monitor".red(),
        ResultCode::Killed => "killed".yellow(),
        ResultCode::Failed => "failed".red(),
    };
    println!("DAG {} {}", dag_id.cyan(), status);

    if outcome.retries > 0 {
        println!("  Retried polls: {}", outcome.retries);
    }

    if let Some(total) = outcome.milestones.total_duration() {
        println!("  Monitored for: {:.2}s", total.as_secs_f64());
    }

    if !outcome.diagnostics.is_empty() {
        println!("\n{}", "Diagnostics:".bold());
        println!("{}", outcome.diagnostics.red());
    }
}

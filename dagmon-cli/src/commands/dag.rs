//! One-shot DAG commands

use anyhow::{Context, Result};
use colored::*;
use dagmon_client::DagClient;
use dagmon_core::dto::job::StatusOptions;
use std::time::Duration;

use crate::config::Config;
use crate::render;

const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch and print one status snapshot
pub async fn show_status(dag_id: &str, json: bool, config: &Config) -> Result<i32> {
    let client = DagClient::new(&config.server_url);
    let snapshot = client
        .get_dag_status(dag_id, &StatusOptions::with_counters(), STATUS_TIMEOUT)
        .await
        .with_context(|| format!("Failed to fetch status of DAG {}", dag_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        render::print_snapshot(dag_id, &snapshot);
    }

    Ok(0)
}

/// Request a kill
pub async fn kill(dag_id: &str, config: &Config) -> Result<i32> {
    let client = DagClient::new(&config.server_url);
    let response = client
        .kill_dag(dag_id)
        .await
        .with_context(|| format!("Failed to kill DAG {}", dag_id))?;

    if response.accepted {
        println!("{} Kill requested for DAG {}", "✓".green(), response.dag_id.cyan());
    } else {
        println!(
            "{} DAG {} had already stopped",
            "-".dimmed(),
            response.dag_id.cyan()
        );
    }

    Ok(0)
}

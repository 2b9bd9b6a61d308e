//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod dag;
mod watch;

pub use watch::WatchArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Monitor a DAG until it finishes
    Watch(WatchArgs),
    /// Print the current status of a DAG
    Status {
        /// DAG id
        dag_id: String,

        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the server to kill a DAG
    Kill {
        /// DAG id
        dag_id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module and returns the
/// process exit status.
pub async fn handle_command(command: Commands, config: &Config) -> Result<i32> {
    match command {
        Commands::Watch(args) => watch::handle_watch(args, config).await,
        Commands::Status { dag_id, json } => dag::show_status(&dag_id, json, config).await,
        Commands::Kill { dag_id } => dag::kill(&dag_id, config).await,
    }
}

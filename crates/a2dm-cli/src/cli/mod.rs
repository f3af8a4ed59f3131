//! CLI for the a2dm download manager.

mod commands;
mod control_socket;

use a2dm_core::config;
use a2dm_core::store::TaskStore;
use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    run_add, run_log, run_manager, run_pause, run_remove, run_resume, run_start, run_status,
    run_stop, AddOpts,
};

/// Top-level CLI for the a2dm download manager.
#[derive(Debug, Parser)]
#[command(name = "a2dm")]
#[command(about = "a2dm: download manager supervising aria2c worker processes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add a new download task.
    Add {
        /// Direct HTTP/HTTPS/FTP URL to download.
        url: String,

        #[command(flatten)]
        opts: AddOpts,
    },

    /// Drive tasks until every one is terminal. Ctrl-C pauses running tasks
    /// and exits; a later run resumes them from their checkpoints.
    Run {
        /// Run up to N tasks at once, overriding max_active from config (0 = no cap).
        #[arg(long, value_name = "N")]
        max_active: Option<usize>,
    },

    /// Show all tasks.
    Status,

    /// Start a queued, stopped or failed task by its ID.
    Start {
        /// Task identifier.
        id: i64,
    },

    /// Pause a running task by its ID, keeping checkpoint and partial file.
    Pause {
        /// Task identifier.
        id: i64,
    },

    /// Resume a paused task by its ID.
    Resume {
        /// Task identifier.
        id: i64,
    },

    /// Stop a task by its ID. The checkpoint is kept unless
    /// stop_discards_checkpoint is set in config.
    Stop {
        /// Task identifier.
        id: i64,
    },

    /// Remove a task (and optionally its files) by ID.
    Remove {
        /// Task identifier.
        id: i64,

        /// Also delete the partial or finished output file.
        #[arg(long)]
        delete_files: bool,
    },

    /// Print a task's history.
    Log {
        /// Task identifier.
        id: i64,

        /// Only the last N entries.
        #[arg(long, value_name = "N")]
        tail: Option<usize>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = TaskStore::open_default().await?;

        match cli.command {
            CliCommand::Add { url, opts } => run_add(&store, &cfg, &url, opts).await?,
            CliCommand::Run { max_active } => run_manager(&store, &cfg, max_active).await?,
            CliCommand::Status => run_status(&store).await?,
            CliCommand::Start { id } => run_start(&store, id).await?,
            CliCommand::Pause { id } => run_pause(&store, id).await?,
            CliCommand::Resume { id } => run_resume(&store, id).await?,
            CliCommand::Stop { id } => run_stop(&store, &cfg, id).await?,
            CliCommand::Remove { id, delete_files } => {
                run_remove(&store, id, delete_files).await?;
            }
            CliCommand::Log { id, tail } => run_log(&store, id, tail).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

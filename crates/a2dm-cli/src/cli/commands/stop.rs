//! `a2dm stop <id>` – stop a task. The stop_discards_checkpoint config
//! policy applies on both paths: the live manager discards the artifacts
//! itself, the cold path does it here after recording the status.

use a2dm_core::checkpoint::Checkpoint;
use a2dm_core::config::A2dmConfig;
use a2dm_core::store::{HistoryKind, TaskStore};
use a2dm_core::task::TaskCommand;
use anyhow::{Context, Result};

use super::cold_transition;
use crate::cli::control_socket;

pub async fn run_stop(store: &TaskStore, cfg: &A2dmConfig, id: i64) -> Result<()> {
    if control_socket::send_to_live_manager("stop", id).await? {
        println!("Stop of task {id} handed to the active run");
        return Ok(());
    }
    let status = cold_transition(store, id, TaskCommand::Stop).await?;
    if cfg.stop_discards_checkpoint {
        discard_artifacts(store, id).await?;
    }
    println!("Task {id} is now {status}");
    Ok(())
}

async fn discard_artifacts(store: &TaskStore, id: i64) -> Result<()> {
    let rec = store
        .get_task(id)
        .await?
        .with_context(|| format!("unknown task {id}"))?;
    let checkpoint = Checkpoint::for_output(rec.config.output_path());
    match checkpoint.remove_all() {
        Ok(()) => {
            store
                .append_history(
                    id,
                    HistoryKind::State,
                    "checkpoint and partial file discarded",
                )
                .await?;
        }
        Err(e) => tracing::warn!(task_id = id, "checkpoint discard failed: {e}"),
    }
    Ok(())
}

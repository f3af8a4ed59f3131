//! `a2dm remove <id>` – remove a task; optionally delete its files with
//! --delete-files. The control file always goes with the task.

use a2dm_core::checkpoint::Checkpoint;
use a2dm_core::store::TaskStore;
use anyhow::{Context, Result};

use crate::cli::control_socket;

pub async fn run_remove(store: &TaskStore, id: i64, delete_files: bool) -> Result<()> {
    let verb = if delete_files { "remove-files" } else { "remove" };
    if control_socket::send_to_live_manager(verb, id).await? {
        println!("Removal of task {id} handed to the active run");
        return Ok(());
    }

    let rec = store
        .get_task(id)
        .await?
        .with_context(|| format!("unknown task {id}"))?;
    let checkpoint = Checkpoint::for_output(rec.config.output_path());
    let cleanup = if delete_files {
        checkpoint.remove_all()
    } else {
        checkpoint.remove_control()
    };
    if let Err(e) = cleanup {
        tracing::warn!(task_id = id, "file cleanup failed: {e}");
    }
    store.remove_task(id).await?;
    println!("Removed task {id}");
    Ok(())
}

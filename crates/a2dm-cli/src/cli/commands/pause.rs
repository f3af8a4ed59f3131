//! `a2dm pause <id>` – pause a task. If `a2dm run` is active, the live
//! manager terminates the engine; otherwise the stored status is settled
//! directly (a queued task becomes stopped, an interrupted one paused).

use a2dm_core::store::TaskStore;
use a2dm_core::task::TaskCommand;
use anyhow::Result;

use super::cold_transition;
use crate::cli::control_socket;

pub async fn run_pause(store: &TaskStore, id: i64) -> Result<()> {
    if control_socket::send_to_live_manager("pause", id).await? {
        println!("Pause of task {id} handed to the active run");
        return Ok(());
    }
    let status = cold_transition(store, id, TaskCommand::Pause).await?;
    println!("Task {id} is now {status}");
    Ok(())
}

//! `a2dm resume <id>` – resume a paused task.

use a2dm_core::store::TaskStore;
use a2dm_core::task::{TaskCommand, TaskStatus};
use anyhow::Result;

use super::cold_transition;
use crate::cli::control_socket;

pub async fn run_resume(store: &TaskStore, id: i64) -> Result<()> {
    if control_socket::send_to_live_manager("resume", id).await? {
        println!("Resume of task {id} handed to the active run");
        return Ok(());
    }
    match cold_transition(store, id, TaskCommand::Resume).await? {
        TaskStatus::Queued => {
            println!("Task {id} queued; `a2dm run` will continue it from its checkpoint")
        }
        other => println!("Task {id} is now {other}"),
    }
    Ok(())
}

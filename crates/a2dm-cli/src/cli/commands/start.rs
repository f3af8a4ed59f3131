//! `a2dm start <id>` – start a queued, stopped or failed task.

use a2dm_core::store::TaskStore;
use a2dm_core::task::{TaskCommand, TaskStatus};
use anyhow::Result;

use super::cold_transition;
use crate::cli::control_socket;

pub async fn run_start(store: &TaskStore, id: i64) -> Result<()> {
    if control_socket::send_to_live_manager("start", id).await? {
        println!("Start of task {id} handed to the active run");
        return Ok(());
    }
    match cold_transition(store, id, TaskCommand::Start).await? {
        TaskStatus::Queued => println!("Task {id} queued; `a2dm run` will start it"),
        other => println!("Task {id} is now {other}"),
    }
    Ok(())
}

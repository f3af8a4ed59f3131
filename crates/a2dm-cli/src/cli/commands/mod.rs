//! CLI command handlers. Each command is in its own file.

mod add;
mod log;
mod pause;
mod remove;
mod resume;
mod run;
mod start;
mod status;
mod stop;

pub use add::{run_add, AddOpts};
pub use log::run_log;
pub use pause::run_pause;
pub use remove::run_remove;
pub use resume::run_resume;
pub use run::run_manager;
pub use start::run_start;
pub use status::run_status;
pub use stop::run_stop;

use a2dm_core::store::{HistoryKind, TaskStore};
use a2dm_core::task::{next_status, TaskCommand, TaskId, TaskStatus};
use anyhow::{Context, Result};

/// Applies `command` to a stored task with no manager process involved.
///
/// Nothing can actually run here, so a transition into running settles as
/// queued for the next `a2dm run` to pick up; the other transitions apply as
/// the state machine says. Returns the resulting status.
pub(crate) async fn cold_transition(
    store: &TaskStore,
    id: TaskId,
    command: TaskCommand,
) -> Result<TaskStatus> {
    let rec = store
        .get_task(id)
        .await?
        .with_context(|| format!("unknown task {id}"))?;
    let next = match next_status(rec.status, command)? {
        TaskStatus::Running => TaskStatus::Queued,
        next => next,
    };
    if next != rec.status {
        store.set_status(id, next).await?;
        store
            .append_history(
                id,
                HistoryKind::State,
                &format!("{} -> {}: {} issued with no manager active", rec.status, next, command),
            )
            .await?;
    }
    Ok(next)
}

use crate::engine::SpawnError;
use crate::task::{InvalidTransition, TaskId};
use thiserror::Error;

/// Failure of one task command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown task {0}")]
    UnknownTask(TaskId),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

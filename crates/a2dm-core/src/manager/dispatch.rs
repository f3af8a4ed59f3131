//! Command dispatch: user commands applied under the per-task lock.

use super::error::CommandError;
use super::{TaskCell, TaskManager};
use crate::checkpoint::Checkpoint;
use crate::engine::Worker;
use crate::store::HistoryKind;
use crate::task::{next_status, Task, TaskCommand, TaskId, TaskStatus};
use std::time::Duration;

impl TaskManager {
    /// Applies one user command to one task. Runs entirely under the task's
    /// lock, so it cannot interleave with the monitor loop on the same task.
    pub async fn command(&self, id: TaskId, command: TaskCommand) -> Result<(), CommandError> {
        let cell = self.cell(id).ok_or(CommandError::UnknownTask(id))?;
        if command == TaskCommand::Remove {
            return self.remove_locked(id, &cell, false).await;
        }

        let mut task = cell.lock().await;
        let next = next_status(task.status, command)?;
        match next {
            TaskStatus::Running => self.spawn_worker(&mut task, command).await,
            next => {
                if task.worker.is_some() {
                    self.halt_worker(&mut task, next).await?;
                } else {
                    self.apply_transition(&mut task, next, "no engine attached")
                        .await?;
                }
                if command == TaskCommand::Stop && self.inner.cfg.stop_discards_checkpoint {
                    self.discard_checkpoint(&mut task).await;
                }
                Ok(())
            }
        }
    }

    /// Removes a task in any status: a live engine is terminated first, the
    /// control file always goes, the output only on request, then the row
    /// and the in-memory entry disappear.
    pub async fn remove(&self, id: TaskId, delete_files: bool) -> Result<(), CommandError> {
        let cell = self.cell(id).ok_or(CommandError::UnknownTask(id))?;
        self.remove_locked(id, &cell, delete_files).await
    }

    async fn remove_locked(
        &self,
        id: TaskId,
        cell: &TaskCell,
        delete_files: bool,
    ) -> Result<(), CommandError> {
        let mut task = cell.lock().await;
        if task.worker.is_some() {
            self.halt_worker(&mut task, TaskStatus::Stopped).await?;
        }
        let checkpoint = Checkpoint::for_output(task.config.output_path());
        let cleanup = if delete_files {
            checkpoint.remove_all()
        } else {
            checkpoint.remove_control()
        };
        if let Err(e) = cleanup {
            tracing::warn!(task_id = id, "file cleanup failed: {e}");
        }
        self.inner.store.remove_task(id).await?;
        self.inner.tasks.lock().unwrap().remove(&id);
        tracing::info!(task_id = id, delete_files, "task removed");
        Ok(())
    }

    /// Launches the engine and moves the task to running. A spawn failure
    /// marks the task failed and is returned to the caller.
    async fn spawn_worker(
        &self,
        task: &mut Task,
        command: TaskCommand,
    ) -> Result<(), CommandError> {
        let checkpoint = Checkpoint::for_output(task.config.output_path());
        let resuming = checkpoint.exists();
        match Worker::spawn(task.id, &task.config, &self.inner.cfg.engine) {
            Ok(worker) => {
                task.worker = Some(worker);
                task.ticks_since_progress_note = 0;
                let note = match (command, resuming) {
                    (TaskCommand::Resume, _) => "engine respawned from checkpoint",
                    (_, true) => "engine spawned, continuing from leftover checkpoint",
                    (_, false) => "engine spawned fresh",
                };
                self.apply_transition(task, TaskStatus::Running, note).await?;
                Ok(())
            }
            Err(e) => {
                let note = format!("engine spawn failed: {e}");
                tracing::error!(task_id = task.id, "{note}");
                if let Err(db_err) = self
                    .apply_transition(task, TaskStatus::Failed, &note)
                    .await
                {
                    tracing::warn!(
                        task_id = task.id,
                        "spawn failure not fully recorded: {db_err:#}"
                    );
                }
                Err(CommandError::Spawn(e))
            }
        }
    }

    /// Terminates the attached engine, folds its final output into snapshot
    /// and history, then applies `next` (paused or stopped).
    async fn halt_worker(
        &self,
        task: &mut Task,
        next: TaskStatus,
    ) -> Result<(), CommandError> {
        let Some(worker) = task.worker.take() else {
            return Ok(());
        };
        let grace = Duration::from_secs(self.inner.cfg.terminate_grace_secs.max(1));
        let feed = worker.feed();
        match worker.terminate(grace).await {
            Ok(status) => {
                tracing::debug!(task_id = task.id, ?status, "engine stopped");
            }
            Err(e) => {
                tracing::warn!(task_id = task.id, "engine termination error: {e}");
            }
        }
        if let Some(snap) = feed.sample() {
            task.snapshot = Some(snap);
        }
        let id = task.id;
        for line in feed.drain_output() {
            if let Err(e) = self
                .inner
                .store
                .append_history(id, HistoryKind::Engine, &line)
                .await
            {
                tracing::warn!(task_id = id, "history append failed: {e:#}");
            }
        }
        let note = match (next, &task.snapshot) {
            (TaskStatus::Paused, Some(snap)) => {
                format!("engine stopped at {snap}, checkpoint kept")
            }
            (TaskStatus::Paused, None) => "engine stopped, checkpoint kept".to_string(),
            (_, Some(snap)) => format!("engine stopped at {snap}"),
            (_, None) => "engine stopped".to_string(),
        };
        self.apply_transition(task, next, &note).await?;
        Ok(())
    }

    async fn discard_checkpoint(&self, task: &mut Task) {
        let checkpoint = Checkpoint::for_output(task.config.output_path());
        match checkpoint.remove_all() {
            Ok(()) => {
                if let Err(e) = self
                    .inner
                    .store
                    .append_history(
                        task.id,
                        HistoryKind::State,
                        "checkpoint and partial file discarded",
                    )
                    .await
                {
                    tracing::warn!(task_id = task.id, "history append failed: {e:#}");
                }
            }
            Err(e) => tracing::warn!(task_id = task.id, "checkpoint discard failed: {e}"),
        }
    }

    /// Writes a status change to memory, store and history in one step.
    pub(crate) async fn apply_transition(
        &self,
        task: &mut Task,
        next: TaskStatus,
        note: &str,
    ) -> anyhow::Result<()> {
        let prev = task.status;
        task.status = next;
        self.inner.store.set_status(task.id, next).await?;
        let kind = if next == TaskStatus::Failed {
            HistoryKind::Error
        } else {
            HistoryKind::State
        };
        let message = if note.is_empty() {
            format!("{prev} -> {next}")
        } else {
            format!("{prev} -> {next}: {note}")
        };
        self.inner
            .store
            .append_history(task.id, kind, &message)
            .await?;
        tracing::info!(
            task_id = task.id,
            from = prev.as_str(),
            to = next.as_str(),
            "{note}"
        );
        Ok(())
    }
}

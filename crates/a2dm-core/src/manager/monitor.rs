//! Monitor loop: samples progress, detects engine exit, settles results.

use super::{TaskCell, TaskManager};
use crate::engine::WorkerState;
use crate::store::HistoryKind;
use crate::task::{Task, TaskId, TaskStatus};
use std::time::Duration;
use tokio::task::JoinHandle;

impl TaskManager {
    /// Spawns the monitor loop. Every tick it samples each running task's
    /// feed, appends buffered engine output to history, and settles tasks
    /// whose engine exited: exit status zero is completed, anything else is
    /// failed, regardless of what the readout claimed. The loop ends when
    /// [`TaskManager::shutdown`] is called.
    pub fn spawn_monitor(&self) -> JoinHandle<()> {
        let mgr = self.clone();
        tokio::spawn(async move {
            let period = Duration::from_millis(mgr.inner.cfg.poll_interval_ms.max(10));
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if mgr.queue_drain_enabled() {
                            mgr.drain_queue().await;
                        }
                        for (id, cell) in mgr.cells() {
                            mgr.monitor_task(id, &cell).await;
                        }
                    }
                    _ = mgr.inner.shutdown.notified() => {
                        tracing::debug!("monitor loop stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Starts queued tasks in id order while the running count stays under
    /// `max_active`. A start that fails marks that task failed (recorded by
    /// the dispatch path) and the drain moves on.
    async fn drain_queue(&self) {
        let cap = self.inner.cfg.max_active;
        let mut running = 0usize;
        let mut queued = Vec::new();
        for (id, cell) in self.cells() {
            match cell.lock().await.status {
                TaskStatus::Running => running += 1,
                TaskStatus::Queued => queued.push(id),
                _ => {}
            }
        }
        for id in queued {
            if cap > 0 && running >= cap {
                break;
            }
            match self.command(id, crate::task::TaskCommand::Start).await {
                Ok(()) => running += 1,
                Err(e) => tracing::warn!(task_id = id, "queued task failed to start: {e}"),
            }
        }
    }

    async fn monitor_task(&self, id: TaskId, cell: &TaskCell) {
        let mut task = cell.lock().await;
        if task.status != TaskStatus::Running {
            return;
        }
        let Some(feed) = task.worker.as_ref().map(|w| w.feed()) else {
            return;
        };

        if let Some(snap) = feed.sample() {
            task.snapshot = Some(snap);
        }
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

        let state = match task.worker.as_mut().map(|w| w.poll()) {
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                tracing::warn!(task_id = id, "engine poll failed: {e}");
                return;
            }
            None => return,
        };

        match state {
            WorkerState::Alive => self.note_progress(&mut task).await,
            exited => self.settle_exit(&mut task, exited).await,
        }
    }

    /// Appends a progress note every `progress_log_every_ticks` ticks so the
    /// history shows a download advancing without drowning in samples.
    async fn note_progress(&self, task: &mut Task) {
        task.ticks_since_progress_note += 1;
        if task.ticks_since_progress_note < self.inner.cfg.progress_log_every_ticks.max(1) {
            return;
        }
        task.ticks_since_progress_note = 0;
        let Some(snap) = &task.snapshot else {
            return;
        };
        let note = snap.to_string();
        if let Err(e) = self
            .inner
            .store
            .append_history(task.id, HistoryKind::Progress, &note)
            .await
        {
            tracing::warn!(task_id = task.id, "history append failed: {e:#}");
        }
    }

    /// Folds a finished engine process into the task: flush the readers,
    /// take the final snapshot and output, then apply completed or failed.
    async fn settle_exit(&self, task: &mut Task, state: WorkerState) {
        let Some(worker) = task.worker.take() else {
            return;
        };
        let feed = worker.feed();
        worker.finish().await;
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

        let result = match state {
            WorkerState::ExitedOk => {
                let note = match &task.snapshot {
                    Some(snap) => format!(
                        "engine exited cleanly ({})",
                        crate::progress::format_bytes(snap.bytes_done)
                    ),
                    None => "engine exited cleanly".to_string(),
                };
                self.apply_transition(task, TaskStatus::Completed, &note)
                    .await
            }
            WorkerState::ExitedError(code) => {
                let cause = match code {
                    Some(c) => format!("engine exited with code {c}"),
                    None => "engine killed by signal".to_string(),
                };
                let note = match &task.snapshot {
                    Some(snap) => format!("{cause} at {snap}"),
                    None => cause,
                };
                self.apply_transition(task, TaskStatus::Failed, &note).await
            }
            WorkerState::Alive => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(task_id = id, "exit settlement not fully recorded: {e:#}");
        }
    }
}

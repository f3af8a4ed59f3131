//! Task orchestration: owns the in-memory task set and drives state.
//!
//! Lock discipline: the task map sits behind a plain mutex taken only for
//! insert/remove/collect and never held across an await. Each task's mutable
//! state (status, worker handle, snapshot) sits behind its own async mutex,
//! held for the whole of any command or monitor step, so user commands and
//! the monitor loop cannot interleave on one task. Engine spawn and
//! termination run inside that per-task critical section; termination is
//! bounded by the configured grace period.

mod dispatch;
mod error;
mod monitor;


pub use error::CommandError;

use crate::config::A2dmConfig;
use crate::progress::ProgressSnapshot;
use crate::store::{HistoryEntry, HistoryKind, TaskRecord, TaskStore};
use crate::task::{Task, TaskCommand, TaskConfig, TaskId, TaskStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex as TaskMutex, Notify};

type TaskCell = Arc<TaskMutex<Task>>;

struct ManagerInner {
    store: TaskStore,
    cfg: A2dmConfig,
    tasks: StdMutex<HashMap<TaskId, TaskCell>>,
    drain_queue: AtomicBool,
    shutdown: Notify,
}

/// Cloneable handle to the orchestrator, shared by the monitor loop, the
/// control socket and the CLI driver.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<ManagerInner>,
}

/// Read-only view of one task for listings.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub id: TaskId,
    pub url: String,
    pub status: TaskStatus,
    pub snapshot: Option<ProgressSnapshot>,
}

impl TaskManager {
    pub fn new(store: TaskStore, cfg: A2dmConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                store,
                cfg,
                tasks: StdMutex::new(HashMap::new()),
                drain_queue: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
        }
    }

    /// Loads every stored task into memory. Tasks still marked running were
    /// interrupted by a dead manager; their engine processes are gone but
    /// their checkpoints are still on disk, so they are settled as paused
    /// before loading. Returns the number of tasks loaded.
    pub async fn rehydrate(&self) -> anyhow::Result<usize> {
        let interrupted = self.inner.store.recover_interrupted().await?;
        for id in &interrupted {
            self.inner
                .store
                .append_history(
                    *id,
                    HistoryKind::State,
                    "running -> paused: previous manager exited mid-run, checkpoint kept",
                )
                .await?;
            tracing::warn!(task_id = id, "interrupted task settled as paused");
        }

        let records = self.inner.store.list_tasks().await?;
        let loaded = records.len();
        let mut tasks = self.inner.tasks.lock().unwrap();
        for rec in records {
            let id = rec.id;
            tasks.entry(id).or_insert_with(|| cell_from_record(rec));
        }
        Ok(loaded)
    }

    /// Stores a new task and registers it in memory as queued.
    pub async fn add_task(&self, config: TaskConfig) -> anyhow::Result<TaskId> {
        let id = self.inner.store.add_task(&config).await?;
        self.inner
            .store
            .append_history(id, HistoryKind::State, "task added")
            .await?;
        let cell = Arc::new(TaskMutex::new(Task::new(id, config)));
        self.inner.tasks.lock().unwrap().insert(id, cell);
        tracing::info!(task_id = id, "task added");
        Ok(id)
    }

    /// Picks up tasks another process appended to the store (e.g. `a2dm add`
    /// while `a2dm run` is active). Returns how many were adopted.
    pub async fn adopt_new(&self) -> anyhow::Result<usize> {
        let records = self.inner.store.list_tasks().await?;
        let mut tasks = self.inner.tasks.lock().unwrap();
        let mut adopted = 0;
        for rec in records {
            let id = rec.id;
            if !tasks.contains_key(&id) {
                tasks.insert(id, cell_from_record(rec));
                adopted += 1;
            }
        }
        drop(tasks);
        if adopted > 0 {
            tracing::info!(count = adopted, "adopted tasks added by another process");
        }
        Ok(adopted)
    }

    /// Point-in-time view of every task, ordered by id.
    pub async fn list_snapshot(&self) -> Vec<TaskView> {
        let cells = self.cells();
        let mut out = Vec::with_capacity(cells.len());
        for (_, cell) in cells {
            let task = cell.lock().await;
            out.push(TaskView {
                id: task.id,
                url: task.config.url.clone(),
                status: task.status,
                snapshot: task.snapshot.clone(),
            });
        }
        out
    }

    /// Full history of one task, oldest first.
    pub async fn read_history(&self, id: TaskId) -> Result<Vec<HistoryEntry>, CommandError> {
        if self.cell(id).is_none() {
            return Err(CommandError::UnknownTask(id));
        }
        Ok(self.inner.store.read_history(id).await?)
    }

    /// True while any task is queued or running.
    pub async fn has_work(&self) -> bool {
        for (_, cell) in self.cells() {
            let task = cell.lock().await;
            if matches!(task.status, TaskStatus::Queued | TaskStatus::Running) {
                return true;
            }
        }
        false
    }

    /// Pauses every running task (shutdown path). Returns how many paused.
    pub async fn pause_running(&self) -> usize {
        let mut paused = 0;
        for (id, cell) in self.cells() {
            let running = cell.lock().await.status == TaskStatus::Running;
            if !running {
                continue;
            }
            match self.command(id, TaskCommand::Pause).await {
                Ok(()) => paused += 1,
                // Settled on its own between the check and the command.
                Err(CommandError::InvalidTransition(_)) => {}
                Err(e) => tracing::warn!(task_id = id, "pause on shutdown failed: {e}"),
            }
        }
        paused
    }

    /// Makes the monitor loop start queued tasks on its own, keeping at most
    /// `max_active` running at once (0 means no cap). Off by default so that
    /// only explicit commands decide what runs; `a2dm run` switches it on to
    /// drain the queue.
    pub fn enable_queue_drain(&self) {
        self.inner.drain_queue.store(true, Ordering::Relaxed);
    }

    pub(crate) fn queue_drain_enabled(&self) -> bool {
        self.inner.drain_queue.load(Ordering::Relaxed)
    }

    /// Signals the monitor loop to stop after its current tick.
    pub fn shutdown(&self) {
        self.inner.shutdown.notify_one();
    }

    fn cells(&self) -> Vec<(TaskId, TaskCell)> {
        let tasks = self.inner.tasks.lock().unwrap();
        let mut cells: Vec<_> = tasks
            .iter()
            .map(|(id, cell)| (*id, Arc::clone(cell)))
            .collect();
        cells.sort_by_key(|(id, _)| *id);
        cells
    }

    fn cell(&self, id: TaskId) -> Option<TaskCell> {
        self.inner.tasks.lock().unwrap().get(&id).cloned()
    }
}

fn cell_from_record(rec: TaskRecord) -> TaskCell {
    let mut task = Task::new(rec.id, rec.config);
    task.status = rec.status;
    Arc::new(TaskMutex::new(task))
}

//! `a2dm run` – drive the manager until every task is terminal.
//!
//! Rehydrates the store, turns on queue draining so queued tasks start up to
//! max_active at a time, listens on the control socket for live commands,
//! and prints a progress line while anything is running. Ctrl-C pauses all
//! running tasks (checkpoints kept) before exiting.

use a2dm_core::config::A2dmConfig;
use a2dm_core::control;
use a2dm_core::manager::TaskManager;
use a2dm_core::store::TaskStore;
use a2dm_core::task::TaskStatus;
use anyhow::Result;
use std::io::Write;
use std::time::Duration;

use crate::cli::control_socket;

pub async fn run_manager(
    store: &TaskStore,
    cfg: &A2dmConfig,
    max_active: Option<usize>,
) -> Result<()> {
    let mut cfg = cfg.clone();
    if let Some(n) = max_active {
        cfg.max_active = n;
    }

    let mgr = TaskManager::new(store.clone(), cfg.clone());
    let loaded = mgr.rehydrate().await?;
    tracing::info!("loaded {loaded} task(s) from the store");
    mgr.enable_queue_drain();
    let monitor = mgr.spawn_monitor();

    let socket_path = control::default_control_socket_path()?;
    let listener = control_socket::spawn_control_listener(mgr.clone(), &socket_path)?;

    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.poll_interval_ms.max(100)));
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Tasks appended by `a2dm add` while this run is active. A
                // transient store error skips one adoption round; it must not
                // tear down the run past the shutdown and socket cleanup.
                if let Err(e) = mgr.adopt_new().await {
                    tracing::warn!("task adoption failed: {e:#}");
                }
                print_progress(&mgr).await;
                if !mgr.has_work().await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                let paused = mgr.pause_running().await;
                println!("Interrupted: paused {paused} running task(s), checkpoints kept.");
                interrupted = true;
                break;
            }
        }
    }

    mgr.shutdown();
    let _ = monitor.await;
    listener.abort();
    let _ = std::fs::remove_file(&socket_path);

    if !interrupted {
        println!();
        print_summary(&mgr).await;
    }
    Ok(())
}

/// One `\r`-rewritten line listing every running task's latest snapshot.
async fn print_progress(mgr: &TaskManager) {
    let views = mgr.list_snapshot().await;
    let mut parts = Vec::new();
    for v in &views {
        if v.status != TaskStatus::Running {
            continue;
        }
        match &v.snapshot {
            Some(snap) => parts.push(format!("#{} {}", v.id, snap)),
            None => parts.push(format!("#{} starting", v.id)),
        }
    }
    if parts.is_empty() {
        return;
    }
    print!("\r{}        ", parts.join("  |  "));
    let _ = std::io::stdout().flush();
}

async fn print_summary(mgr: &TaskManager) {
    let views = mgr.list_snapshot().await;
    if views.is_empty() {
        println!("No tasks.");
        return;
    }
    let count = |status: TaskStatus| views.iter().filter(|v| v.status == status).count();
    println!(
        "Done: {} completed, {} failed, {} paused, {} stopped.",
        count(TaskStatus::Completed),
        count(TaskStatus::Failed),
        count(TaskStatus::Paused),
        count(TaskStatus::Stopped)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    // The loop must reach the shutdown and socket cleanup on its own once no
    // task is queued or running, whatever happened during the ticks.
    #[tokio::test]
    async fn run_with_no_work_exits_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open_at(dir.path().join("tasks.db")).await.unwrap();
        let mut cfg = A2dmConfig::default();
        cfg.poll_interval_ms = 50;

        run_manager(&store, &cfg, None).await.unwrap();

        let socket_path = control::default_control_socket_path().unwrap();
        assert!(!socket_path.exists(), "socket file removed on exit");
    }
}

//! Control socket: listener inside `a2dm run`, client for other invocations.
//! Protocol: one line per command, `<verb> <task-id>`, where the verb is
//! start, pause, resume, stop, remove or remove-files. Delivery is
//! fire-and-forget; the run process records failures in its own log and the
//! task history rather than answering the client.

use a2dm_core::control;
use a2dm_core::manager::TaskManager;
use a2dm_core::task::{TaskCommand, TaskId};
use anyhow::Result;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Spawns a task that listens on `path` and dispatches each command line to
/// the manager. Malformed lines are ignored.
pub fn spawn_control_listener(
    mgr: TaskManager,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    let handle = tokio::spawn(async move {
        let _ = std::fs::remove_file(&path);
        let listener = match UnixListener::bind(&path) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(path = %path.display(), "control socket bind: {e}");
                return;
            }
        };
        tracing::debug!(path = %path.display(), "control socket listening");
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let mgr = mgr.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            dispatch_line(&mgr, line.trim()).await;
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {e}"),
            }
        }
    });
    Ok(handle)
}

async fn dispatch_line(mgr: &TaskManager, line: &str) {
    let Some((verb, rest)) = line.split_once(' ') else {
        return;
    };
    let Ok(id) = rest.trim().parse::<TaskId>() else {
        return;
    };
    let result = match verb {
        "remove" => mgr.remove(id, false).await,
        "remove-files" => mgr.remove(id, true).await,
        verb => match TaskCommand::parse(verb) {
            Some(cmd) => mgr.command(id, cmd).await,
            None => {
                tracing::debug!("control socket: unknown verb {verb:?}");
                return;
            }
        },
    };
    match result {
        Ok(()) => tracing::info!(task_id = id, "control socket applied {verb}"),
        Err(e) => tracing::warn!(task_id = id, "control socket {verb} failed: {e}"),
    }
}

/// Sends `<verb> <id>` to the control socket of an active `a2dm run`.
/// Returns false when no run is listening, so the caller can fall back to
/// editing the store directly.
pub async fn send_to_live_manager(verb: &str, id: TaskId) -> Result<bool> {
    let path = control::default_control_socket_path()?;
    if !path.exists() {
        return Ok(false);
    }
    // A leftover socket from a crashed run refuses connections; treat that
    // the same as no run at all.
    let mut stream = match UnixStream::connect(&path).await {
        Ok(stream) => stream,
        Err(_) => return Ok(false),
    };
    stream.write_all(format!("{verb} {id}\n").as_bytes()).await?;
    Ok(true)
}

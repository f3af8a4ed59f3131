//! One spawned engine process: output readers, liveness polling, termination.

use super::args::{build_args, engine_binary};
use super::error::SpawnError;
use crate::config::EngineDefaults;
use crate::progress::{parse_readout, ProgressFeed};
use crate::task::{TaskConfig, TaskId};
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Result of a liveness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Alive,
    /// Exit status zero: the download finished.
    ExitedOk,
    /// Nonzero exit; None means the process died to a signal.
    ExitedError(Option<i32>),
}

/// Handle to a live engine process for one task.
///
/// Stdout and stderr are drained continuously by background readers into the
/// shared [`ProgressFeed`]; the exit status seen by [`Worker::poll`] is the
/// sole authority on success or failure.
#[derive(Debug)]
pub struct Worker {
    child: Child,
    feed: Arc<ProgressFeed>,
    readers: Vec<JoinHandle<()>>,
    pid: Option<u32>,
}

impl Worker {
    /// Launches the engine for `cfg`. Fails only when the process cannot be
    /// created; a process that starts and dies immediately is reported by the
    /// next [`Worker::poll`] instead.
    pub fn spawn(
        task_id: TaskId,
        cfg: &TaskConfig,
        defaults: &EngineDefaults,
    ) -> Result<Worker, SpawnError> {
        let binary = engine_binary(cfg, defaults);
        let argv = build_args(cfg, defaults);
        let mut child = Command::new(&binary)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpawnError::from_io(binary.clone(), e))?;

        let feed = Arc::new(ProgressFeed::new());
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(task_id, stdout, Arc::clone(&feed)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(task_id, stderr, Arc::clone(&feed)));
        }
        let pid = child.id();
        tracing::info!(task_id, pid, binary = %binary.display(), "engine spawned");
        Ok(Worker {
            child,
            feed,
            readers,
            pid,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Shared handle to this run's progress feed.
    pub fn feed(&self) -> Arc<ProgressFeed> {
        Arc::clone(&self.feed)
    }

    /// Non-blocking liveness check via the process exit status.
    pub fn poll(&mut self) -> io::Result<WorkerState> {
        match self.child.try_wait()? {
            None => Ok(WorkerState::Alive),
            Some(status) if status.success() => Ok(WorkerState::ExitedOk),
            Some(status) => Ok(WorkerState::ExitedError(status.code())),
        }
    }

    /// Stops the engine: graceful signal first, then a forced kill once
    /// `grace` elapses. Returns the exit status; always bounded.
    pub async fn terminate(mut self, grace: Duration) -> io::Result<std::process::ExitStatus> {
        if self.child.try_wait()?.is_none() {
            self.send_term();
        }
        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(res) => res?,
            Err(_) => {
                tracing::warn!(pid = self.pid, "engine ignored graceful stop, killing");
                let _ = self.child.start_kill();
                self.child.wait().await?
            }
        };
        self.join_readers().await;
        Ok(status)
    }

    /// Releases a worker whose process already exited: waits for the output
    /// readers to flush the tail of the pipes into the feed.
    pub async fn finish(mut self) {
        self.join_readers().await;
    }

    fn send_term(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.pid {
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGTERM);
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }
    }

    async fn join_readers(&mut self) {
        for handle in self.readers.drain(..) {
            let _ = handle.await;
        }
    }
}

/// Feeds one pipe of engine output into the progress feed, line by line.
/// Readout lines become snapshots; everything else is buffered for history.
fn spawn_reader<R>(task_id: TaskId, pipe: R, feed: Arc<ProgressFeed>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_readout(&line) {
                Some(readout) => feed.record_readout(readout),
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        tracing::debug!(task_id, "engine: {}", trimmed);
                        feed.record_output(trimmed.to_string());
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(binary: &str) -> (TaskConfig, EngineDefaults) {
        let defaults = EngineDefaults {
            engine_path: binary.into(),
            ..Default::default()
        };
        let cfg = TaskConfig::new("https://example.com/x.bin", "/tmp", &defaults);
        (cfg, defaults)
    }

    #[tokio::test]
    async fn spawn_missing_binary_is_not_found() {
        let (cfg, defaults) = config_for("/nonexistent/a2dm-test-engine");
        let err = Worker::spawn(1, &cfg, &defaults).unwrap_err();
        assert!(matches!(err, SpawnError::NotFound { .. }));
    }

    #[tokio::test]
    async fn poll_reports_natural_exit() {
        // /bin/echo ignores the argv it is handed and exits zero at once.
        let (cfg, defaults) = config_for("/bin/echo");
        let mut worker = Worker::spawn(1, &cfg, &defaults).unwrap();
        let mut state = WorkerState::Alive;
        for _ in 0..200 {
            state = worker.poll().unwrap();
            if state != WorkerState::Alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state, WorkerState::ExitedOk);
        worker.finish().await;
    }

    #[tokio::test]
    async fn echoed_argv_lands_in_feed() {
        let (cfg, defaults) = config_for("/bin/echo");
        let mut worker = Worker::spawn(1, &cfg, &defaults).unwrap();
        while worker.poll().unwrap() == WorkerState::Alive {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let feed = worker.feed();
        worker.finish().await;
        let lines = feed.drain_output();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("https://example.com/x.bin"));
    }
}

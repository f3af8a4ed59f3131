//! Task model: status lifecycle, user commands and per-task configuration.

use crate::config::EngineDefaults;
use crate::engine::Worker;
use crate::naming;
use crate::progress::ProgressSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub type TaskId = i64;

/// Lifecycle status of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Registered, no engine process yet.
    Queued,
    /// A live engine process is attached.
    Running,
    /// Engine terminated by the user, checkpoint and partial file kept for resume.
    Paused,
    /// Halted by the user; restartable from scratch (or from a leftover checkpoint).
    Stopped,
    /// Engine exited successfully; only removal is allowed from here.
    Completed,
    /// Engine exited with an error or could not be spawned; restartable.
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Paused => "paused",
            TaskStatus::Stopped => "stopped",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Parses a stored status string. Unknown strings map to `Failed` so a
    /// corrupted row stays visible and restartable instead of wedging the task.
    pub fn from_str(s: &str) -> TaskStatus {
        match s {
            "queued" => TaskStatus::Queued,
            "running" => TaskStatus::Running,
            "paused" => TaskStatus::Paused,
            "stopped" => TaskStatus::Stopped,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Failed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-issued command against a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Remove,
}

impl TaskCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCommand::Start => "start",
            TaskCommand::Pause => "pause",
            TaskCommand::Resume => "resume",
            TaskCommand::Stop => "stop",
            TaskCommand::Remove => "remove",
        }
    }

    pub fn parse(s: &str) -> Option<TaskCommand> {
        match s {
            "start" => Some(TaskCommand::Start),
            "pause" => Some(TaskCommand::Pause),
            "resume" => Some(TaskCommand::Resume),
            "stop" => Some(TaskCommand::Stop),
            "remove" => Some(TaskCommand::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command was issued against a task whose status does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: TaskStatus,
    pub command: TaskCommand,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} task while {}", self.command, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

/// Computes the status a task enters when `command` is applied in `from`.
///
/// Rules:
/// - `start` launches from `queued`, `stopped` or `failed`
/// - `pause`/`stop` on a `queued` task settle it as `stopped` (nothing to terminate)
/// - `pause` and `resume` pair only across `running` and `paused`
/// - `completed` accepts no command (removal bypasses this table)
///
/// `Remove` is valid in every status and is handled by the manager directly;
/// it never goes through this table.
pub fn next_status(
    from: TaskStatus,
    command: TaskCommand,
) -> Result<TaskStatus, InvalidTransition> {
    use TaskCommand::*;
    use TaskStatus::*;

    match (from, command) {
        (Queued, Start) | (Stopped, Start) | (Failed, Start) => Ok(Running),
        (Queued, Pause) | (Queued, Stop) => Ok(Stopped),
        (Running, Pause) => Ok(Paused),
        (Running, Stop) => Ok(Stopped),
        (Paused, Resume) => Ok(Running),
        (Paused, Stop) => Ok(Stopped),
        _ => Err(InvalidTransition { from, command }),
    }
}

/// Per-task download configuration, persisted as JSON alongside the task row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub url: String,
    /// Destination directory, resolved when the task is added.
    pub dir: PathBuf,
    /// Output filename within `dir`, derived from the URL unless overridden.
    pub out: String,
    pub split: u32,
    pub max_connections: u32,
    pub max_tries: u32,
    pub retry_wait_secs: u32,
    /// Engine-format rate cap, e.g. "500K" or "2M".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_download_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Raw header lines, one "Name: value" per entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    /// Per-task engine binary override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
    /// Extra argv entries appended before the URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl TaskConfig {
    /// Builds a task configuration from a URL and destination directory,
    /// deriving the output filename and filling engine knobs from `defaults`.
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>, defaults: &EngineDefaults) -> Self {
        let url = url.into();
        let out = naming::filename_for_url(&url);
        Self {
            url,
            dir: dir.into(),
            out,
            split: defaults.split,
            max_connections: defaults.max_connections,
            max_tries: defaults.max_tries,
            retry_wait_secs: defaults.retry_wait_secs,
            max_download_limit: None,
            max_upload_limit: None,
            referer: None,
            user_agent: None,
            headers: Vec::new(),
            engine_path: None,
            extra_args: Vec::new(),
        }
    }

    /// Full path of the output file.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.out)
    }
}

/// In-memory state of one task while a manager owns it.
pub struct Task {
    pub id: TaskId,
    pub config: TaskConfig,
    pub status: TaskStatus,
    /// Last progress sample from the current or most recent engine run.
    pub snapshot: Option<ProgressSnapshot>,
    pub(crate) worker: Option<Worker>,
    pub(crate) ticks_since_progress_note: u32,
}

impl Task {
    pub fn new(id: TaskId, config: TaskConfig) -> Self {
        Self {
            id,
            config,
            status: TaskStatus::Queued,
            snapshot: None,
            worker: None,
            ticks_since_progress_note: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_transitions() {
        use TaskCommand::*;
        use TaskStatus::*;

        let cases = [
            (Queued, Start, Running),
            (Stopped, Start, Running),
            (Failed, Start, Running),
            (Queued, Pause, Stopped),
            (Queued, Stop, Stopped),
            (Running, Pause, Paused),
            (Running, Stop, Stopped),
            (Paused, Resume, Running),
            (Paused, Stop, Stopped),
        ];
        for (from, cmd, want) in cases {
            assert_eq!(next_status(from, cmd), Ok(want), "{from} + {cmd}");
        }
    }

    #[test]
    fn rejected_transitions() {
        use TaskCommand::*;
        use TaskStatus::*;

        let cases = [
            (Running, Start),
            (Running, Resume),
            (Paused, Start),
            (Paused, Pause),
            (Queued, Resume),
            (Stopped, Resume),
            (Stopped, Pause),
            (Stopped, Stop),
            (Failed, Resume),
            (Failed, Pause),
            (Completed, Start),
            (Completed, Pause),
            (Completed, Resume),
            (Completed, Stop),
        ];
        for (from, cmd) in cases {
            let err = next_status(from, cmd).unwrap_err();
            assert_eq!(err.from, from);
            assert_eq!(err.command, cmd);
        }
    }

    #[test]
    fn start_on_running_is_rejected() {
        let err = next_status(TaskStatus::Running, TaskCommand::Start).unwrap_err();
        assert_eq!(err.to_string(), "cannot start task while running");
    }

    #[test]
    fn status_string_roundtrip() {
        use TaskStatus::*;
        for status in [Queued, Running, Paused, Stopped, Completed, Failed] {
            assert_eq!(TaskStatus::from_str(status.as_str()), status);
        }
        assert_eq!(TaskStatus::from_str("bogus"), Failed);
    }

    #[test]
    fn command_string_roundtrip() {
        use TaskCommand::*;
        for cmd in [Start, Pause, Resume, Stop, Remove] {
            assert_eq!(TaskCommand::parse(cmd.as_str()), Some(cmd));
        }
        assert_eq!(TaskCommand::parse("reboot"), None);
    }

    #[test]
    fn task_config_defaults() {
        let defaults = EngineDefaults::default();
        let cfg = TaskConfig::new("https://example.com/iso/disk.img", "/tmp/dl", &defaults);
        assert_eq!(cfg.out, "disk.img");
        assert_eq!(cfg.split, defaults.split);
        assert_eq!(cfg.max_connections, defaults.max_connections);
        assert_eq!(cfg.max_tries, defaults.max_tries);
        assert_eq!(cfg.output_path(), PathBuf::from("/tmp/dl/disk.img"));
        assert!(cfg.headers.is_empty());
        assert!(cfg.engine_path.is_none());
    }

    #[test]
    fn task_config_json_roundtrip() {
        let defaults = EngineDefaults::default();
        let mut cfg = TaskConfig::new("https://example.com/f.bin", "/tmp", &defaults);
        cfg.max_download_limit = Some("500K".to_string());
        cfg.headers.push("Authorization: Bearer x".to_string());
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: TaskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, cfg.url);
        assert_eq!(parsed.out, cfg.out);
        assert_eq!(parsed.max_download_limit.as_deref(), Some("500K"));
        assert_eq!(parsed.headers, cfg.headers);
    }
}

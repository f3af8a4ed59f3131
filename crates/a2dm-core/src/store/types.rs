//! Store-facing task record and history types.

use crate::task::{TaskConfig, TaskId, TaskStatus};

/// One task row as stored.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub url: String,
    pub status: TaskStatus,
    pub config: TaskConfig,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Category of a task history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    /// Status transition or other lifecycle note.
    State,
    /// Raw engine output line.
    Engine,
    /// Periodic progress note.
    Progress,
    /// Failure detail.
    Error,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::State => "state",
            HistoryKind::Engine => "engine",
            HistoryKind::Progress => "progress",
            HistoryKind::Error => "error",
        }
    }

    /// Parses a stored kind string; unknown strings map to `Engine`.
    pub fn from_str(s: &str) -> HistoryKind {
        match s {
            "state" => HistoryKind::State,
            "progress" => HistoryKind::Progress,
            "error" => HistoryKind::Error,
            _ => HistoryKind::Engine,
        }
    }
}

/// One append-only history entry of a task, timestamp-ordered.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub at: i64,
    pub kind: HistoryKind,
    pub message: String,
}

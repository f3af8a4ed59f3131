//! Append-only per-task history: transitions, engine output, progress notes.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, TaskStore};
use super::types::{HistoryEntry, HistoryKind};
use crate::task::TaskId;

impl TaskStore {
    /// Append one history entry for a task. Entries are never updated or
    /// reordered; reads return them in timestamp order.
    pub async fn append_history(
        &self,
        task_id: TaskId,
        kind: HistoryKind,
        message: &str,
    ) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO task_history (task_id, at, kind, message)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(task_id)
        .bind(now)
        .bind(kind.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Full history of one task, oldest first. Insertion order breaks
    /// timestamp ties, so same-second entries keep their append order.
    pub async fn read_history(&self, task_id: TaskId) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT at, kind, message
            FROM task_history
            WHERE task_id = ?1
            ORDER BY at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(entry_from_row(&row));
        }
        Ok(out)
    }

    /// Last `limit` history entries of one task, oldest of those first.
    pub async fn read_history_tail(
        &self,
        task_id: TaskId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT at, kind, message
            FROM task_history
            WHERE task_id = ?1
            ORDER BY at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(task_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(entry_from_row(&row));
        }
        out.reverse();
        Ok(out)
    }
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> HistoryEntry {
    let at: i64 = row.get("at");
    let kind_str: String = row.get("kind");
    let message: String = row.get("message");
    HistoryEntry {
        at,
        kind: HistoryKind::from_str(&kind_str),
        message,
    }
}

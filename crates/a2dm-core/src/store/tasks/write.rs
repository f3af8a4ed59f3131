//! Task write operations: add, status updates, remove, interruption recovery.

use anyhow::Result;
use sqlx::Row;

use super::super::db::{unix_timestamp, TaskStore};
use crate::task::{TaskConfig, TaskId, TaskStatus};

impl TaskStore {
    /// Insert a new queued task and return its id.
    pub async fn add_task(&self, config: &TaskConfig) -> Result<TaskId> {
        let now = unix_timestamp();
        let config_json = serde_json::to_string(config)?;

        let row_id = sqlx::query(
            r#"
            INSERT INTO tasks (url, status, config_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&config.url)
        .bind(TaskStatus::Queued.as_str())
        .bind(config_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Update the status of an existing task.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Permanently remove a task row together with its history.
    ///
    /// File cleanup is handled separately by higher layers.
    pub async fn remove_task(&self, id: TaskId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            DELETE FROM task_history
            WHERE task_id = ?1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Settle any task left in `running` by a crashed or killed manager as
    /// `paused`: its engine process is gone but its checkpoint file is still
    /// on disk, so resume is the accurate continuation. Returns the affected
    /// ids so the caller can annotate their history.
    pub async fn recover_interrupted(&self) -> Result<Vec<TaskId>> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT id FROM tasks
            WHERE status = 'running'
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;
        let ids: Vec<TaskId> = rows.iter().map(|row| row.get("id")).collect();
        if !ids.is_empty() {
            sqlx::query(
                r#"
                UPDATE tasks
                SET status = 'paused',
                    updated_at = ?1
                WHERE status = 'running'
                "#,
            )
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(ids)
    }
}

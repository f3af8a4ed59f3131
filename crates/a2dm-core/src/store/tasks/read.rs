//! Task read operations: list and get.

use anyhow::Result;
use sqlx::Row;

use super::super::db::TaskStore;
use super::super::types::TaskRecord;
use crate::task::{TaskConfig, TaskId, TaskStatus};

impl TaskStore {
    /// List all tasks in creation order (ascending id).
    pub async fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, status, config_json, created_at, updated_at
            FROM tasks
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(record_from_row(&row)?);
        }

        Ok(out)
    }

    /// Fetch a single task row.
    pub async fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, url, status, config_json, created_at, updated_at
            FROM tasks
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(record_from_row(&row)?))
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TaskRecord> {
    let id: i64 = row.get("id");
    let url: String = row.get("url");
    let status_str: String = row.get("status");
    let config_json: String = row.get("config_json");
    let created_at: i64 = row.get("created_at");
    let updated_at: i64 = row.get("updated_at");

    let config: TaskConfig = serde_json::from_str(&config_json)?;

    Ok(TaskRecord {
        id,
        url,
        status: TaskStatus::from_str(&status_str),
        config,
        created_at,
        updated_at,
    })
}

//! `a2dm log <id>` – print a task's history, oldest first.

use a2dm_core::store::TaskStore;
use anyhow::{Context, Result};
use chrono::DateTime;

pub async fn run_log(store: &TaskStore, id: i64, tail: Option<usize>) -> Result<()> {
    store
        .get_task(id)
        .await?
        .with_context(|| format!("unknown task {id}"))?;

    let entries = match tail {
        Some(n) => store.read_history_tail(id, n).await?,
        None => store.read_history(id).await?,
    };
    if entries.is_empty() {
        println!("No history for task {id}.");
        return Ok(());
    }
    for e in entries {
        println!("{} {:<8} {}", format_timestamp(e.at), e.kind.as_str(), e.message);
    }
    Ok(())
}

/// Renders a unix timestamp as `YYYY-MM-DD HH:MM:SS` UTC. An out-of-range
/// value falls back to the raw number rather than failing the listing.
fn format_timestamp(unix: i64) -> String {
    match DateTime::from_timestamp(unix, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => unix.to_string(),
    }
}

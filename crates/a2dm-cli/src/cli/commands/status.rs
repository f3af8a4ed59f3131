//! `a2dm status` – show every task.

use a2dm_core::store::TaskStore;
use anyhow::Result;

pub async fn run_status(store: &TaskStore) -> Result<()> {
    let tasks = store.list_tasks().await?;
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    println!("{:<6} {:<10} {:<30} {}", "ID", "STATUS", "FILE", "URL");
    for t in tasks {
        println!(
            "{:<6} {:<10} {:<30} {}",
            t.id,
            t.status.as_str(),
            t.config.out,
            t.url
        );
    }
    Ok(())
}

//! Tests for the task store (use the in-memory helper from db).

use crate::config::EngineDefaults;
use crate::store::db::open_memory;
use crate::store::HistoryKind;
use crate::task::{TaskConfig, TaskStatus};

fn sample_config(url: &str) -> TaskConfig {
    TaskConfig::new(url, "/tmp/dl", &EngineDefaults::default())
}

#[tokio::test]
async fn task_status_roundtrip_via_store() {
    let store = open_memory().await.unwrap();
    let id = store
        .add_task(&sample_config("https://example.com/file.bin"))
        .await
        .unwrap();
    let tasks = store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].status, TaskStatus::Queued);
    assert_eq!(tasks[0].url, "https://example.com/file.bin");

    store.set_status(id, TaskStatus::Running).await.unwrap();
    assert_eq!(
        store.list_tasks().await.unwrap()[0].status,
        TaskStatus::Running
    );

    store.set_status(id, TaskStatus::Paused).await.unwrap();
    assert_eq!(
        store.list_tasks().await.unwrap()[0].status,
        TaskStatus::Paused
    );

    store.set_status(id, TaskStatus::Completed).await.unwrap();
    assert_eq!(
        store.list_tasks().await.unwrap()[0].status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn recover_interrupted_settles_running_as_paused() {
    let store = open_memory().await.unwrap();
    let id1 = store
        .add_task(&sample_config("https://a.com/one"))
        .await
        .unwrap();
    let id2 = store
        .add_task(&sample_config("https://b.com/two"))
        .await
        .unwrap();
    store.set_status(id1, TaskStatus::Running).await.unwrap();
    store.set_status(id2, TaskStatus::Stopped).await.unwrap();

    let interrupted = store.recover_interrupted().await.unwrap();
    assert_eq!(interrupted, vec![id1]);

    let tasks = store.list_tasks().await.unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Paused);
    assert_eq!(tasks[1].status, TaskStatus::Stopped);

    // Idempotent when nothing is running.
    assert!(store.recover_interrupted().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_list_remove_tasks() {
    let store = open_memory().await.unwrap();
    assert!(store.list_tasks().await.unwrap().is_empty());

    let id1 = store
        .add_task(&sample_config("https://a.com/one"))
        .await
        .unwrap();
    let id2 = store
        .add_task(&sample_config("https://b.com/two"))
        .await
        .unwrap();
    let tasks = store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
    // Creation order
    assert_eq!(tasks[0].id, id1);
    assert_eq!(tasks[0].url, "https://a.com/one");
    assert_eq!(tasks[1].id, id2);
    assert_eq!(tasks[1].url, "https://b.com/two");

    store.remove_task(id1).await.unwrap();
    let tasks = store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id2);
}

#[tokio::test]
async fn task_config_survives_storage() {
    let store = open_memory().await.unwrap();
    let mut config = sample_config("https://example.com/big.iso");
    config.max_download_limit = Some("500K".to_string());
    config.headers.push("X-Token: abc".to_string());
    config.extra_args.push("--check-certificate=false".to_string());
    let id = store.add_task(&config).await.unwrap();

    let rec = store.get_task(id).await.unwrap().expect("task exists");
    assert_eq!(rec.url, "https://example.com/big.iso");
    assert_eq!(rec.config.out, "big.iso");
    assert_eq!(rec.config.max_download_limit.as_deref(), Some("500K"));
    assert_eq!(rec.config.headers, vec!["X-Token: abc"]);
    assert_eq!(rec.config.extra_args, vec!["--check-certificate=false"]);

    assert!(store.get_task(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn history_appends_in_order() {
    let store = open_memory().await.unwrap();
    let id = store
        .add_task(&sample_config("https://example.com/x"))
        .await
        .unwrap();

    store
        .append_history(id, HistoryKind::State, "queued -> running")
        .await
        .unwrap();
    store
        .append_history(id, HistoryKind::Engine, "[#1 0B/0B(0%)]")
        .await
        .unwrap();
    store
        .append_history(id, HistoryKind::Progress, "10% done")
        .await
        .unwrap();

    let entries = store.read_history(id).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, HistoryKind::State);
    assert_eq!(entries[0].message, "queued -> running");
    assert_eq!(entries[1].kind, HistoryKind::Engine);
    assert_eq!(entries[2].kind, HistoryKind::Progress);
    assert!(entries[0].at <= entries[2].at);

    let tail = store.read_history_tail(id, 2).await.unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].message, "[#1 0B/0B(0%)]");
    assert_eq!(tail[1].message, "10% done");
}

#[tokio::test]
async fn remove_task_drops_history_too() {
    let store = open_memory().await.unwrap();
    let id = store
        .add_task(&sample_config("https://example.com/x"))
        .await
        .unwrap();
    store
        .append_history(id, HistoryKind::State, "task added")
        .await
        .unwrap();
    assert_eq!(store.read_history(id).await.unwrap().len(), 1);

    store.remove_task(id).await.unwrap();
    assert!(store.get_task(id).await.unwrap().is_none());
    assert!(store.read_history(id).await.unwrap().is_empty());
}

//! `a2dm add <url>` – register a new download task.

use a2dm_core::config::A2dmConfig;
use a2dm_core::engine::split_args;
use a2dm_core::naming;
use a2dm_core::store::{HistoryKind, TaskStore};
use a2dm_core::task::TaskConfig;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Per-task overrides; unset fields fall back to config.toml defaults.
#[derive(Debug, Args)]
pub struct AddOpts {
    /// Destination directory (default: download_dir from config, else the current directory).
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output filename (default: derived from the URL).
    #[arg(long, value_name = "NAME")]
    pub out: Option<String>,

    /// Number of connections the download is split into.
    #[arg(long, value_name = "N")]
    pub split: Option<u32>,

    /// Maximum connections per server.
    #[arg(long, value_name = "N")]
    pub max_connections: Option<u32>,

    /// Maximum attempts per transfer (including the first).
    #[arg(long, value_name = "N")]
    pub max_tries: Option<u32>,

    /// Seconds to wait between attempts.
    #[arg(long, value_name = "SECS")]
    pub retry_wait: Option<u32>,

    /// Download rate cap in engine format, e.g. "500K" or "2M".
    #[arg(long, value_name = "RATE")]
    pub max_download_limit: Option<String>,

    /// Upload rate cap in engine format.
    #[arg(long, value_name = "RATE")]
    pub max_upload_limit: Option<String>,

    /// Referer header to send.
    #[arg(long, value_name = "URL")]
    pub referer: Option<String>,

    /// User-Agent header to send.
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Extra header line "Name: value"; repeatable.
    #[arg(long = "header", value_name = "LINE")]
    pub headers: Vec<String>,

    /// Engine binary for this task only.
    #[arg(long, value_name = "PATH")]
    pub engine_path: Option<PathBuf>,

    /// Extra engine arguments as one quoted string, split shell-style.
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub extra_args: Option<String>,
}

pub async fn run_add(store: &TaskStore, cfg: &A2dmConfig, url: &str, opts: AddOpts) -> Result<()> {
    let dir = match opts.dir {
        Some(dir) => dir,
        None => match &cfg.download_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        },
    };

    let mut task = TaskConfig::new(url, dir, &cfg.engine);
    if let Some(out) = opts.out {
        let name = naming::sanitize_filename(&out);
        if !name.is_empty() {
            task.out = name;
        }
    }
    if let Some(split) = opts.split {
        task.split = split;
    }
    if let Some(n) = opts.max_connections {
        task.max_connections = n;
    }
    if let Some(n) = opts.max_tries {
        task.max_tries = n;
    }
    if let Some(secs) = opts.retry_wait {
        task.retry_wait_secs = secs;
    }
    task.max_download_limit = opts.max_download_limit;
    task.max_upload_limit = opts.max_upload_limit;
    task.referer = opts.referer;
    task.user_agent = opts.user_agent;
    task.headers = opts.headers;
    task.engine_path = opts.engine_path;
    if let Some(args) = opts.extra_args {
        task.extra_args = split_args(&args);
    }

    let id = store.add_task(&task).await?;
    store.append_history(id, HistoryKind::State, "task added").await?;
    println!("Added task {id}: {url} -> {}", task.output_path().display());
    Ok(())
}

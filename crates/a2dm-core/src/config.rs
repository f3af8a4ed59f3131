use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Engine invocation defaults applied to new tasks (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDefaults {
    /// Path or bare name of the aria2c executable (bare names resolve via PATH).
    pub engine_path: PathBuf,
    /// Number of connections each download is split into.
    pub split: u32,
    /// Maximum connections per server.
    pub max_connections: u32,
    /// Maximum attempts per transfer (including the first).
    pub max_tries: u32,
    /// Seconds to wait between attempts.
    pub retry_wait_secs: u32,
    /// File allocation mode handed to the engine: "none", "prealloc", "trunc" or "falloc".
    pub file_allocation: String,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("aria2c"),
            split: 4,
            max_connections: 4,
            max_tries: 5,
            retry_wait_secs: 0,
            file_allocation: "none".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/a2dm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2dmConfig {
    /// Default download directory for new tasks (None = working directory at add time).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Maximum number of tasks running at once while `a2dm run` drains the queue.
    pub max_active: usize,
    /// Monitor poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Seconds to wait after a graceful stop before the engine is force-killed.
    pub terminate_grace_secs: u64,
    /// A progress note is appended to task history every this many monitor ticks.
    pub progress_log_every_ticks: u32,
    /// When true, stopping a task also deletes its checkpoint and partial file.
    /// The default keeps both so a stopped task can be started again later.
    pub stop_discards_checkpoint: bool,
    /// Engine invocation defaults; if the section is missing, built-in defaults are used.
    #[serde(default)]
    pub engine: EngineDefaults,
}

impl Default for A2dmConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            max_active: 4,
            poll_interval_ms: 1000,
            terminate_grace_secs: 5,
            progress_log_every_ticks: 15,
            stop_discards_checkpoint: false,
            engine: EngineDefaults::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("a2dm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<A2dmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = A2dmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: A2dmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

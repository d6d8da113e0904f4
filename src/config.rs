use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fs::{EntryKind, DEFAULT_STRIP_LEADING};
use crate::logging::{default_log_dir, LOG_FILE_NAME};
use crate::watcher::{WatchMode, WatchOptions};
use crate::worker::{PendingPolicy, DEFAULT_PENDING_CAPACITY};

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE_NAME: &str = "pagewatch.toml";

/// Where the build writes prerendered pages.
pub const DEFAULT_OUTPUT_DIR: &str = ".svelte-kit/output/prerendered/pages";

/// Where the source pages live, relative to the build's working directory.
pub const DEFAULT_PAGES_DIR: &str = "../../pages";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingMode {
    #[default]
    Buffer,
    Drop,
}

/// Monitor settings, from `pagewatch.toml` and command-line overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub output_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub mode: WatchMode,
    /// Leading components removed from expected page paths.
    pub strip_leading: usize,
    pub count: EntryKind,
    pub poll_interval_ms: u64,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
    pub worker_path: Option<PathBuf>,
    pub worker_args: Vec<String>,
    pub pending: PendingMode,
    pub pending_capacity: usize,
    pub log_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pages_dir: PathBuf::from(DEFAULT_PAGES_DIR),
            mode: WatchMode::Simple,
            strip_leading: DEFAULT_STRIP_LEADING,
            count: EntryKind::All,
            poll_interval_ms: 250,
            timeout_secs: None,
            worker_path: None,
            worker_args: Vec::new(),
            pending: PendingMode::Buffer,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            log_dir: default_log_dir(),
        }
    }
}

impl MonitorConfig {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            count: self.count,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }

    pub fn pending_policy(&self) -> PendingPolicy {
        match self.pending {
            PendingMode::Buffer => PendingPolicy::Buffer {
                capacity: self.pending_capacity,
            },
            PendingMode::Drop => PendingPolicy::Drop,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The session log file inside the log directory.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    fn validate(&self) -> Result<()> {
        if self.pending == PendingMode::Buffer && self.pending_capacity == 0 {
            bail!("pending_capacity must be at least 1 when buffering");
        }
        Ok(())
    }
}

/// Load and parse a config file.
///
/// # Returns
/// * `Ok(Some(config))` - File loaded and parsed successfully
/// * `Ok(None)` - File doesn't exist
/// * `Err(_)` - Failed to read, parse or validate it
pub fn load_config(path: &Path) -> Result<Option<MonitorConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: MonitorConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;

    Ok(Some(config))
}

/// Load the explicitly given config file, else `pagewatch.toml` in the
/// working directory, else defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<MonitorConfig> {
    if let Some(path) = explicit {
        return load_config(path)?
            .ok_or_else(|| anyhow::anyhow!("Config file not found: {}", path.display()));
    }
    Ok(load_config(Path::new(CONFIG_FILE_NAME))?.unwrap_or_default())
}

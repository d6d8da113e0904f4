//! `pagewatch watch`: report build progress until the build is done.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{resolve_config, MonitorConfig, PendingMode};
use crate::fs::{discover_pages, expected_page_count, EntryKind};
use crate::logging::LogSink;
use crate::monitor::{run_simple, run_with_worker, SessionOutcome};
use crate::progress::ConsoleReporter;
use crate::stop::StopSignal;
use crate::watcher::WatchMode;

/// Command-line overrides for the monitor configuration.
#[derive(Debug, Default, Clone)]
pub struct WatchArgs {
    pub config: Option<PathBuf>,
    pub mode: Option<WatchMode>,
    pub output_dir: Option<PathBuf>,
    pub pages_dir: Option<PathBuf>,
    pub total: Option<u64>,
    pub count: Option<EntryKind>,
    pub timeout_secs: Option<u64>,
    pub worker: Option<PathBuf>,
    pub drop_early_updates: bool,
}

impl WatchArgs {
    fn apply(self, mut config: MonitorConfig) -> MonitorConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.pages_dir {
            config.pages_dir = dir;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        if let Some(worker) = self.worker {
            config.worker_path = Some(worker);
        }
        if self.drop_early_updates {
            config.pending = PendingMode::Drop;
        }
        config
    }
}

/// Stop on Ctrl-C and, if configured, after the timeout.
fn stop_signal(config: &MonitorConfig) -> StopSignal {
    let (handle, stop) = StopSignal::cancellable();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });
    stop.with_optional_timeout(config.timeout())
}

pub async fn execute(args: WatchArgs, sink: &LogSink) -> Result<()> {
    let explicit_total = args.total;
    let config = args.clone().apply(resolve_config(args.config.as_deref())?);
    let stop = stop_signal(&config);

    match config.mode {
        WatchMode::Simple => {
            let total = match explicit_total {
                Some(total) => total,
                None => expected_page_count(&config.pages_dir)
                    .with_context(|| {
                        format!("Failed to count pages in {}", config.pages_dir.display())
                    })?,
            };
            if total == 0 {
                tracing::warn!("No pages expected; progress will stay at 0%");
            }
            tracing::info!(total, "Watching {}", config.output_dir.display());

            // Monitoring problems are reported, never turned into a failed build
            if let Err(e) = run_simple(&config, total, &mut ConsoleReporter, &stop).await {
                tracing::error!("Progress monitoring ended: {e}");
                eprintln!("{} {e}", "warning:".yellow().bold());
            }
        }
        WatchMode::PerDirectory => {
            let pages = discover_pages(&config.pages_dir)
                .with_context(|| {
                    format!("Failed to list pages in {}", config.pages_dir.display())
                })?;

            match run_with_worker(&config, &pages, sink, &stop).await {
                Ok(SessionOutcome::Degraded) => {
                    println!("{}", "All the pages have been built.".green());
                }
                Ok(outcome) => tracing::info!(?outcome, "Monitoring session finished"),
                Err(e) => {
                    tracing::error!("Progress monitoring ended: {e}");
                    eprintln!("{} {e}", "warning:".yellow().bold());
                }
            }
        }
    }

    Ok(())
}

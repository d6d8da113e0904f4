//! Monitoring sessions: wiring watchers, reporters and the worker together.

use std::future::pending;
use std::path::PathBuf;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::fs::{resolve_watch_list, wait_for_existence};
use crate::logging::LogSink;
use crate::progress::{LogReporter, ProgressReporter};
use crate::stop::StopSignal;
use crate::watcher::{watch_with_reporter, WatchSpec, WatchTarget, WatchUpdate, Watcher};
use crate::worker::{resolve_worker, WorkerEvent, WorkerLaunch, WorkerSupervisor};

/// How a worker session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The worker exited normally (the user quit).
    WorkerExited,
    /// The stop signal fired.
    Stopped,
    /// The watcher closed on its own.
    WatchClosed,
    /// No worker could be started; progress was logged instead.
    Degraded,
}

/// Watch the output directory against a single expected total.
pub async fn run_simple<R: ProgressReporter>(
    config: &MonitorConfig,
    expected_total: u64,
    reporter: &mut R,
    stop: &StopSignal,
) -> Result<()> {
    let target = WatchTarget {
        path: config.output_dir.clone(),
        expected_count: expected_total,
    };
    watch_with_reporter(target, config.watch_options(), reporter, stop).await
}

async fn next_worker_event(worker: &mut Option<WorkerSupervisor>) -> WorkerEvent {
    match worker {
        Some(worker) => worker.next_event().await,
        None => pending().await,
    }
}

/// Run a per-directory watch that feeds the terminal worker.
///
/// If the worker cannot be started, falls back to a simple watch whose
/// progress goes to the log. If the worker dies with an error, watching
/// continues headless with counts logged until `stop` fires.
pub async fn run_with_worker(
    config: &MonitorConfig,
    expected_pages: &[PathBuf],
    sink: &LogSink,
    stop: &StopSignal,
) -> Result<SessionOutcome> {
    wait_for_existence(&config.output_dir, config.watch_options().poll_interval, stop).await?;
    let list = resolve_watch_list(&config.output_dir, expected_pages, config.strip_leading);
    tracing::info!(
        watched = list.existing.len(),
        pending = list.pending.len(),
        "Resolved watch list"
    );

    let Some(program) = resolve_worker(config.worker_path.as_deref()) else {
        tracing::warn!("Terminal worker not found, logging progress instead");
        return degrade(config, expected_pages.len() as u64, stop).await;
    };

    let launch = WorkerLaunch {
        program: &program,
        args: &config.worker_args,
        runtime_dir: &config.log_dir,
        log_path: &config.log_path(),
        labels: list.labels(),
        policy: config.pending_policy(),
    };
    let mut worker = match WorkerSupervisor::spawn(launch, sink) {
        Ok(worker) => Some(worker),
        Err(e) => {
            tracing::warn!("Failed to start terminal worker: {e}");
            return degrade(config, expected_pages.len() as u64, stop).await;
        }
    };

    let spec = WatchSpec::PerDirectory(list);
    let mut watcher = match Watcher::start(spec, config.watch_options(), stop).await {
        Ok(watcher) => watcher,
        Err(e) => {
            if let Some(worker) = worker.take() {
                worker.shutdown().await;
            }
            return Err(e);
        }
    };

    let outcome = loop {
        tokio::select! {
            update = watcher.next_update() => match update {
                Some(WatchUpdate::DirectoryCount { dir, count }) => match worker.as_mut() {
                    Some(w) => {
                        if let Err(e) = w.forward(count, dir).await {
                            tracing::warn!("Failed to forward update: {e}");
                        }
                    }
                    None => tracing::info!(dir = %dir, count, "Directory updated"),
                },
                Some(_) => {}
                None => break SessionOutcome::WatchClosed,
            },
            event = next_worker_event(&mut worker) => match event {
                WorkerEvent::Message(inbound) => {
                    if let Some(w) = worker.as_mut() {
                        if let Err(e) = w.handle(inbound).await {
                            tracing::warn!("Failed to answer worker: {e}");
                        }
                    }
                }
                WorkerEvent::Violation(reason) => {
                    tracing::warn!("Ignoring worker message: {reason}")
                }
                WorkerEvent::Exited(Some(0)) => {
                    tracing::info!("Worker exited");
                    break SessionOutcome::WorkerExited;
                }
                WorkerEvent::Exited(code) => {
                    tracing::error!(
                        ?code,
                        "Worker exited unexpectedly, continuing without display"
                    );
                    if let Some(w) = worker.take() {
                        w.shutdown().await;
                    }
                }
            },
            _ = stop.stopped() => break SessionOutcome::Stopped,
        }
    };

    watcher.close();
    if let Some(worker) = worker {
        worker.shutdown().await;
    }
    Ok(outcome)
}

async fn degrade(
    config: &MonitorConfig,
    expected_total: u64,
    stop: &StopSignal,
) -> Result<SessionOutcome> {
    run_simple(config, expected_total, &mut LogReporter, stop).await?;
    Ok(SessionOutcome::Degraded)
}

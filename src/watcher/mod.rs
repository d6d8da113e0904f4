//! Directory watching for build progress.
//!
//! A [`Watcher`] is pulled with [`Watcher::next_update`] and comes in two
//! variants selected by [`WatchMode`]:
//!
//! - `Simple`: one directory, one expected total, reports a percentage and
//!   completes (and unsubscribes) once the total is reached.
//! - `PerDirectory`: a depth-0 watch per directory of a [`WatchList`],
//!   reporting raw per-directory counts. It never stops on its own.

mod directories;
mod events;
mod simple;

pub use directories::DirectoryWatch;
pub use simple::SimpleWatch;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::fs::{EntryKind, WatchList, DEFAULT_POLL_INTERVAL};
use crate::progress::{ProgressReporter, ProgressState};
use crate::stop::StopSignal;

/// Which watcher variant a session runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchMode {
    #[default]
    Simple,
    PerDirectory,
}

impl std::str::FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "simple" => Ok(WatchMode::Simple),
            "per-directory" | "directories" => Ok(WatchMode::PerDirectory),
            other => Err(format!(
                "unknown watch mode '{other}' (expected simple or per-directory)"
            )),
        }
    }
}

/// A directory and the number of entries it is expected to end up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub expected_count: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub count: EntryKind,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            count: EntryKind::All,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// What to watch; the variant decides the watcher variant.
#[derive(Debug, Clone)]
pub enum WatchSpec {
    Simple(WatchTarget),
    PerDirectory(WatchList),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchUpdate {
    Progress(ProgressState),
    /// Simple mode reached its target. Emitted exactly once.
    Complete,
    DirectoryCount { dir: String, count: usize },
}

pub enum Watcher {
    Simple(SimpleWatch),
    PerDirectory(DirectoryWatch),
}

impl Watcher {
    pub async fn start(spec: WatchSpec, options: WatchOptions, stop: &StopSignal) -> Result<Self> {
        match spec {
            WatchSpec::Simple(target) => {
                Ok(Watcher::Simple(SimpleWatch::start(target, options, stop).await?))
            }
            WatchSpec::PerDirectory(list) => {
                Ok(Watcher::PerDirectory(DirectoryWatch::start(&list, options)?))
            }
        }
    }

    /// Next update, or `None` once the watcher is closed.
    pub async fn next_update(&mut self) -> Option<WatchUpdate> {
        match self {
            Watcher::Simple(w) => w.next_update().await,
            Watcher::PerDirectory(w) => w.next_update().await,
        }
    }

    pub fn close(&mut self) {
        match self {
            Watcher::Simple(w) => w.close(),
            Watcher::PerDirectory(w) => w.close(),
        }
    }

    /// Whether a filesystem subscription is currently held.
    pub fn is_watching(&self) -> bool {
        match self {
            Watcher::Simple(w) => w.is_watching(),
            Watcher::PerDirectory(w) => w.is_watching(),
        }
    }
}

/// Adapts a pair of callbacks to [`ProgressReporter`].
pub struct CallbackReporter<P, C> {
    on_progress: P,
    on_complete: Option<C>,
}

impl<P, C> CallbackReporter<P, C>
where
    P: FnMut(u8),
    C: FnOnce(),
{
    pub fn new(on_progress: P, on_complete: C) -> Self {
        Self {
            on_progress,
            on_complete: Some(on_complete),
        }
    }
}

impl<P, C> ProgressReporter for CallbackReporter<P, C>
where
    P: FnMut(u8),
    C: FnOnce(),
{
    fn progress(&mut self, state: &ProgressState) {
        (self.on_progress)(state.percent);
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

/// Run a simple-mode watch to completion, feeding `reporter`.
///
/// Returns once the target is reached, or [`MonitorError::Stopped`] if `stop`
/// fires first.
pub async fn watch_with_reporter<R: ProgressReporter>(
    target: WatchTarget,
    options: WatchOptions,
    reporter: &mut R,
    stop: &StopSignal,
) -> Result<()> {
    let path = target.path.clone();
    let mut watcher = Watcher::start(WatchSpec::Simple(target), options, stop).await?;

    loop {
        let update = tokio::select! {
            update = watcher.next_update() => update,
            _ = stop.stopped() => {
                watcher.close();
                return Err(MonitorError::Stopped(path));
            }
        };

        match update {
            Some(WatchUpdate::Progress(state)) => reporter.progress(&state),
            Some(WatchUpdate::Complete) => reporter.complete(),
            Some(WatchUpdate::DirectoryCount { .. }) => {}
            None => return Ok(()),
        }
    }
}

/// Watch `dir` until it holds `total` entries.
///
/// `on_progress` receives the percentage after every added entry;
/// `on_complete` runs exactly once, immediately if the directory is already
/// complete.
pub async fn watch_directory<P, C>(
    dir: impl Into<PathBuf>,
    total: u64,
    options: WatchOptions,
    on_progress: P,
    on_complete: C,
    stop: &StopSignal,
) -> Result<()>
where
    P: FnMut(u8),
    C: FnOnce(),
{
    let target = WatchTarget {
        path: dir.into(),
        expected_count: total,
    };
    let mut reporter = CallbackReporter::new(on_progress, on_complete);
    watch_with_reporter(target, options, &mut reporter, stop).await
}

//! Single-directory watch against one expected total.

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};

use super::events::{channel_watcher, is_entry_added, RawEvents};
use super::{WatchOptions, WatchTarget, WatchUpdate};
use crate::error::{MonitorError, Result};
use crate::fs::{count_entries, wait_for_existence};
use crate::progress::ProgressState;
use crate::stop::StopSignal;

enum State {
    Watching {
        // Held only to keep the subscription alive
        _watcher: RecommendedWatcher,
        events: RawEvents,
    },
    /// Target reached; `Complete` not yet handed out.
    Reached,
    Closed,
}

pub struct SimpleWatch {
    target: WatchTarget,
    options: WatchOptions,
    state: State,
}

impl SimpleWatch {
    /// Wait for the directory, then subscribe unless the target is already met.
    pub async fn start(
        target: WatchTarget,
        options: WatchOptions,
        stop: &StopSignal,
    ) -> Result<Self> {
        wait_for_existence(&target.path, options.poll_interval, stop).await?;

        let mut watch = Self {
            target,
            options,
            state: State::Closed,
        };

        if watch.recount().await?.is_complete() {
            tracing::debug!("{} already complete, not watching", watch.target.path.display());
            watch.state = State::Reached;
            return Ok(watch);
        }

        let (mut watcher, events) = channel_watcher(&watch.target.path)?;
        watcher
            .watch(&watch.target.path, RecursiveMode::NonRecursive)
            .map_err(|source| MonitorError::Watch {
                path: watch.target.path.clone(),
                source,
            })?;

        // Entries written between the first count and the subscription raise no event
        if watch.recount().await?.is_complete() {
            watch.state = State::Reached;
        } else {
            watch.state = State::Watching {
                _watcher: watcher,
                events,
            };
        }
        Ok(watch)
    }

    async fn recount(&self) -> Result<ProgressState> {
        let current = count_entries(&self.target.path, self.options.count).await?;
        Ok(ProgressState::compute(current as u64, self.target.expected_count))
    }

    pub async fn next_update(&mut self) -> Option<WatchUpdate> {
        loop {
            let received = match &mut self.state {
                State::Reached => {
                    self.state = State::Closed;
                    return Some(WatchUpdate::Complete);
                }
                State::Closed => return None,
                State::Watching { events, .. } => events.recv().await,
            };

            let event = match received {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    tracing::warn!("Watch error on {}: {e}", self.target.path.display());
                    continue;
                }
                None => {
                    self.state = State::Closed;
                    return None;
                }
            };

            if !is_entry_added(&event.kind) {
                continue;
            }

            match self.recount().await {
                Ok(state) => {
                    if state.is_complete() {
                        // Dropping the watcher tears the subscription down
                        self.state = State::Reached;
                    }
                    return Some(WatchUpdate::Progress(state));
                }
                Err(e) => tracing::warn!("Skipping event: {e}"),
            }
        }
    }

    pub fn close(&mut self) {
        self.state = State::Closed;
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, State::Watching { .. })
    }
}

//! Depth-0 watches on every directory of a watch list.

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::events::{channel_watcher, is_dir_added, RawEvents};
use super::{WatchOptions, WatchUpdate};
use crate::error::Result;
use crate::fs::{count_entries, WatchDir, WatchList};

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Closest ancestor of `path` that exists as a directory.
fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors().skip(1).find(|p| p.is_dir())
}

pub struct DirectoryWatch {
    options: WatchOptions,
    watcher: Option<RecommendedWatcher>,
    events: RawEvents,
    /// Canonical watched path -> label
    watched: HashMap<PathBuf, String>,
    /// Expected directories that do not exist yet
    pending: Vec<WatchDir>,
    /// Unlabelled watches on the nearest existing ancestor of a pending directory
    anchors: HashSet<PathBuf>,
    /// Directories to recount. An entry leaves the queue only once counted.
    recounts: VecDeque<(PathBuf, String)>,
}

impl DirectoryWatch {
    /// Attach a watch to every existing directory in `list`, and to the
    /// nearest existing ancestor of every pending one.
    ///
    /// Only creating the underlying watcher can fail; directories that
    /// cannot be watched are logged and skipped.
    pub fn start(list: &WatchList, options: WatchOptions) -> Result<Self> {
        let hint = list
            .existing
            .first()
            .map(|d| d.path.clone())
            .unwrap_or_default();
        let (watcher, events) = channel_watcher(&hint)?;

        let mut watch = Self {
            options,
            watcher: Some(watcher),
            events,
            watched: HashMap::new(),
            pending: list.pending.clone(),
            anchors: HashSet::new(),
            recounts: VecDeque::new(),
        };

        for dir in &list.existing {
            watch.attach(dir);
        }
        watch.advance_pending();

        if watch.watched.is_empty() && !list.existing.is_empty() {
            tracing::warn!("None of the {} directories could be watched", list.existing.len());
        }
        Ok(watch)
    }

    fn attach(&mut self, dir: &WatchDir) -> bool {
        // Already subscribed while waiting for a deeper pending directory
        if self.anchors.remove(&dir.path) {
            self.watched.insert(canonical(&dir.path), dir.label.clone());
            return true;
        }

        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };
        match watcher.watch(&dir.path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::debug!("Watching {} ({})", dir.label, dir.path.display());
                self.watched.insert(canonical(&dir.path), dir.label.clone());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to watch {}: {e}", dir.path.display());
                false
            }
        }
    }

    fn ensure_anchor(&mut self, path: &Path) {
        if self.anchors.contains(path) || self.label_of(path).is_some() {
            return;
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        match watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::debug!("Watching {} for pending directories", path.display());
                self.anchors.insert(path.to_path_buf());
            }
            Err(e) => tracing::warn!("Failed to watch {}: {e}", path.display()),
        }
    }

    /// Attach `dir` if it exists, else move its anchor as deep as the tree
    /// allows. Returns the directory and its anchor while still pending.
    fn settle(&mut self, dir: WatchDir) -> Option<(WatchDir, PathBuf)> {
        loop {
            if dir.path.is_dir() {
                if self.attach(&dir) {
                    self.queue_recount(dir.path.clone(), dir.label.clone());
                }
                return None;
            }

            let Some(anchor) = nearest_existing(&dir.path).map(Path::to_path_buf) else {
                tracing::debug!("No existing ancestor for {}", dir.path.display());
                return Some((dir, PathBuf::new()));
            };
            self.ensure_anchor(&anchor);

            // A level created before the subscription raised no event
            if !dir.path.is_dir() && nearest_existing(&dir.path) == Some(anchor.as_path()) {
                return Some((dir, anchor));
            }
        }
    }

    fn advance_pending(&mut self) {
        let mut needed = HashSet::new();
        for dir in std::mem::take(&mut self.pending) {
            if let Some((dir, anchor)) = self.settle(dir) {
                needed.insert(anchor);
                self.pending.push(dir);
            }
        }

        let unused: Vec<PathBuf> = self
            .anchors
            .iter()
            .filter(|a| !needed.contains(*a))
            .cloned()
            .collect();
        for anchor in unused {
            self.anchors.remove(&anchor);
            if let Some(watcher) = self.watcher.as_mut() {
                if let Err(e) = watcher.unwatch(&anchor) {
                    tracing::debug!("Failed to unwatch {}: {e}", anchor.display());
                }
            }
        }
    }

    fn label_of(&self, path: &Path) -> Option<String> {
        self.watched
            .get(path)
            .or_else(|| self.watched.get(&canonical(path)))
            .cloned()
    }

    /// Labels currently under watch, sorted.
    pub fn watched_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.watched.values().cloned().collect();
        labels.sort();
        labels
    }

    /// Number of directories still expected but not yet attached.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn queue_recount(&mut self, path: PathBuf, label: String) {
        // A queued recount already sees whatever appears before it runs
        if !self.recounts.iter().any(|(_, queued)| *queued == label) {
            self.recounts.push_back((path, label));
        }
    }

    fn handle_created(&mut self, created: &Path) {
        if let Some(parent) = created.parent() {
            if let Some(label) = self.label_of(parent) {
                self.queue_recount(parent.to_path_buf(), label);
            }
        }

        if !self.pending.is_empty() {
            self.advance_pending();
        }
    }

    /// Next directory count, or `None` once closed.
    ///
    /// Cancel safe: a recount interrupted mid-way is redone on the next call.
    pub async fn next_update(&mut self) -> Option<WatchUpdate> {
        loop {
            if let Some((path, label)) = self.recounts.front().cloned() {
                let counted = count_entries(&path, self.options.count).await;
                self.recounts.pop_front();
                match counted {
                    Ok(count) => return Some(WatchUpdate::DirectoryCount { dir: label, count }),
                    Err(e) => {
                        tracing::warn!("Skipping count for {label}: {e}");
                        continue;
                    }
                }
            }

            let event = match self.events.recv().await? {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Watch error: {e}");
                    continue;
                }
            };

            for path in &event.paths {
                if is_dir_added(&event.kind, path) {
                    self.handle_created(path);
                }
            }
        }
    }

    pub fn close(&mut self) {
        // Dropping the watcher drops the event sender, which ends `next_update`
        self.watcher = None;
        self.watched.clear();
        self.pending.clear();
        self.anchors.clear();
        self.recounts.clear();
        self.events.close();
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some() && !(self.watched.is_empty() && self.anchors.is_empty())
    }
}

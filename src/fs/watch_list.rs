//! Resolve expected page paths into the directories worth watching.
//!
//! Expected pages are known before they are built, but filesystem events can
//! only be subscribed on directories that already exist. The resolver maps
//! every expected page to its output directory and splits the result into
//! directories that exist now and ones that will have to be attached later.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Leading components dropped from expected paths by default
/// (e.g. `../../pages` in `../../pages/blog/post.md`).
pub const DEFAULT_STRIP_LEADING: usize = 3;

/// A directory under the watch root, labelled by its root-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDir {
    /// Root-relative path with a leading `/`, e.g. `/blog` (or `/` for the root).
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    /// Directories that exist and can be watched immediately.
    pub existing: Vec<WatchDir>,
    /// Expected directories that do not exist yet.
    pub pending: Vec<WatchDir>,
}

impl WatchList {
    /// Labels of the directories watched from the start.
    pub fn labels(&self) -> Vec<String> {
        self.existing.iter().map(|d| d.label.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty() && self.pending.is_empty()
    }
}

/// Root-relative directory of one expected page, or `None` if stripping
/// consumes the whole path.
fn relative_dir(expected: &Path, strip_leading: usize) -> Option<PathBuf> {
    let components: Vec<Component> = expected.components().collect();
    if components.len() <= strip_leading {
        return None;
    }
    let kept = &components[strip_leading..components.len() - 1];

    let mut rel = PathBuf::new();
    for component in kept {
        match component {
            Component::Normal(name) => rel.push(name),
            // Anything else would escape the watch root
            _ => return None,
        }
    }
    Some(rel)
}

fn label_for(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Build the deduplicated, label-sorted watch list for `expected` pages under `root`.
pub fn resolve_watch_list<P: AsRef<Path>>(
    root: &Path,
    expected: &[P],
    strip_leading: usize,
) -> WatchList {
    let mut dirs: BTreeMap<String, PathBuf> = BTreeMap::new();
    for page in expected {
        let page = page.as_ref();
        match relative_dir(page, strip_leading) {
            Some(rel) => {
                dirs.entry(label_for(&rel)).or_insert_with(|| root.join(&rel));
            }
            None => tracing::debug!("Ignoring expected page {}", page.display()),
        }
    }

    let mut list = WatchList::default();
    for (label, path) in dirs {
        let dir = WatchDir { label, path };
        if dir.path.is_dir() {
            list.existing.push(dir);
        } else {
            list.pending.push(dir);
        }
    }
    list
}

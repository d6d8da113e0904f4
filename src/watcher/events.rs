//! Bridge from notify's callback thread into the async monitor.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher};
use std::path::Path;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::error::{MonitorError, Result};

pub(crate) type RawEvents = UnboundedReceiver<notify::Result<Event>>;

/// Create a watcher whose events are delivered to a tokio channel.
///
/// notify runs its backend on its own thread; the handler only forwards, so
/// all counting happens on the monitor's runtime.
pub(crate) fn channel_watcher(path_hint: &Path) -> Result<(RecommendedWatcher, RawEvents)> {
    let (tx, rx) = unbounded_channel();
    let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .map_err(|source| MonitorError::Watch {
        path: path_hint.to_path_buf(),
        source,
    })?;
    Ok((watcher, rx))
}

/// An entry appeared in a watched directory (`add` or `addDir`).
pub(crate) fn is_entry_added(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

/// A directory appeared at `path` (`addDir`).
///
/// Backends that cannot tell files from folders report `CreateKind::Any`,
/// so those fall back to checking the path.
pub(crate) fn is_dir_added(kind: &EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) => true,
        EventKind::Create(CreateKind::File) => false,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => path.is_dir(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, RemoveKind};
    use tempfile::TempDir;

    #[test]
    fn test_entry_added_kinds() {
        assert!(is_entry_added(&EventKind::Create(CreateKind::File)));
        assert!(is_entry_added(&EventKind::Create(CreateKind::Folder)));
        assert!(is_entry_added(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_entry_added(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(!is_entry_added(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_entry_added(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn test_dir_added_checks_path_for_ambiguous_kinds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("page.html");
        std::fs::write(&file, "").unwrap();

        assert!(is_dir_added(&EventKind::Create(CreateKind::Folder), &file));
        assert!(!is_dir_added(&EventKind::Create(CreateKind::File), temp.path()));
        assert!(is_dir_added(&EventKind::Create(CreateKind::Any), temp.path()));
        assert!(!is_dir_added(&EventKind::Create(CreateKind::Any), &file));
    }
}

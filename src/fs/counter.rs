use serde::Deserialize;
use std::path::Path;

use crate::error::{MonitorError, Result};

/// Which directory entries count as produced artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    All,
    Files,
    Dirs,
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EntryKind::All),
            "files" => Ok(EntryKind::Files),
            "dirs" => Ok(EntryKind::Dirs),
            other => Err(format!("unknown entry kind '{other}' (expected all, files or dirs)")),
        }
    }
}

/// Count the immediate children of `path`.
///
/// Always re-reads the directory: the producer is writing to it concurrently,
/// so a cached answer would be stale.
pub async fn count_entries(path: &Path, kind: EntryKind) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| MonitorError::from_io(path, e))?;

    let mut count = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| MonitorError::from_io(path, e))?
    {
        let matches = match kind {
            EntryKind::All => true,
            // An entry removed between listing and stat simply doesn't count
            EntryKind::Files => entry.file_type().await.is_ok_and(|t| !t.is_dir()),
            EntryKind::Dirs => entry.file_type().await.is_ok_and(|t| t.is_dir()),
        };
        if matches {
            count += 1;
        }
    }

    Ok(count)
}

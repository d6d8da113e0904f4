use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Whether a path contains components the build never turns into pages.
fn is_ignored(path: &Path, base: &Path) -> bool {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || name == "node_modules"
        }
        _ => false,
    })
}

/// List the source pages that will produce output, keeping the `pages_dir` prefix.
///
/// The prefix is kept intact so the watch-list resolver can strip it by
/// component count.
pub fn discover_pages(pages_dir: &Path) -> Result<Vec<PathBuf>> {
    if !pages_dir.is_dir() {
        anyhow::bail!("Pages directory does not exist: {}", pages_dir.display());
    }

    let pattern = pages_dir.join("**").join("*.md");
    let pattern = pattern.to_string_lossy();

    let mut pages = Vec::new();
    for entry in glob::glob(&pattern).context("Invalid pages glob pattern")? {
        let path = entry.context("Failed to read pages directory entry")?;
        if path.is_file() && !is_ignored(&path, pages_dir) {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}

/// Number of pages expected in the build output.
pub fn expected_page_count(pages_dir: &Path) -> Result<u64> {
    Ok(discover_pages(pages_dir)?.len() as u64)
}

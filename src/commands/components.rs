//! `pagewatch components`: list components opted in with `evidenceInclude`.

use anyhow::Result;
use std::path::Path;

use crate::components::library_components;

pub fn execute(root: &Path) -> Result<()> {
    let names = library_components(root)?;

    if names.is_empty() {
        println!("No library components found in {}", root.display());
        return Ok(());
    }

    for name in names {
        println!("{name}");
    }
    Ok(())
}

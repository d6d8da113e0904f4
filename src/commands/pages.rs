//! `pagewatch pages`: show which pages the build is expected to produce.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::resolve_config;
use crate::fs::{discover_pages, resolve_watch_list};

pub fn execute(pages_dir: Option<PathBuf>, config: Option<PathBuf>, list: bool) -> Result<()> {
    let config = resolve_config(config.as_deref())?;
    let pages_dir = pages_dir.unwrap_or(config.pages_dir.clone());

    let pages = discover_pages(&pages_dir)?;
    println!("{} pages expected in {}", pages.len().to_string().bold(), pages_dir.display());

    if list {
        for page in &pages {
            println!("  {}", page.display());
        }

        let watch_list = resolve_watch_list(&config.output_dir, &pages, config.strip_leading);
        if !watch_list.is_empty() {
            println!("\n{}", "Output directories:".bold());
            for dir in &watch_list.existing {
                println!("  {} {}", "●".green(), dir.label);
            }
            for dir in &watch_list.pending {
                println!("  {} {} (not built yet)", "○".dimmed(), dir.label);
            }
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use pagewatch::commands::{components, pages, watch};
use pagewatch::fs::EntryKind;
use pagewatch::logging::{init_tracing, LogSink};
use pagewatch::watcher::WatchMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagewatch")]
#[command(about = "Report progress of a static page build", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the build output and report progress
    Watch {
        /// Config file (defaults to ./pagewatch.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// simple (percentage) or per-directory (terminal worker)
        #[arg(short, long)]
        mode: Option<WatchMode>,

        /// Directory the build writes pages into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Directory holding the source pages
        #[arg(short, long)]
        pages_dir: Option<PathBuf>,

        /// Expected number of entries (skips page discovery in simple mode)
        #[arg(short, long)]
        total: Option<u64>,

        /// Which entries to count: all, files or dirs
        #[arg(long)]
        count: Option<EntryKind>,

        /// Give up after this many seconds (default: never)
        #[arg(long)]
        timeout: Option<u64>,

        /// Path to the terminal worker executable
        #[arg(long)]
        worker: Option<PathBuf>,

        /// Discard updates produced before the worker is ready instead of buffering them
        #[arg(long)]
        drop_early_updates: bool,
    },

    /// Show how many pages the build is expected to produce
    Pages {
        /// Directory holding the source pages
        pages_dir: Option<PathBuf>,

        /// Config file (defaults to ./pagewatch.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// List every page and the output directories they map to
        #[arg(short, long)]
        list: bool,
    },

    /// List components marked with `export const evidenceInclude = true`
    Components {
        /// Directory to search for .svelte components
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let sink = LogSink::new();
    init_tracing(sink.clone(), cli.verbose);

    match cli.command {
        Commands::Watch {
            config,
            mode,
            output_dir,
            pages_dir,
            total,
            count,
            timeout,
            worker,
            drop_early_updates,
        } => {
            let args = watch::WatchArgs {
                config,
                mode,
                output_dir,
                pages_dir,
                total,
                count,
                timeout_secs: timeout,
                worker,
                drop_early_updates,
            };
            watch::execute(args, &sink).await
        }
        Commands::Pages {
            pages_dir,
            config,
            list,
        } => pages::execute(pages_dir, config, list),
        Commands::Components { root } => components::execute(&root),
    }
}

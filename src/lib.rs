//! Build-progress monitor for incrementally generated page output.
//!
//! Waits for the build's output directory, counts what has been written,
//! and reports progress either as console percentages or through a
//! terminal worker process fed over a small JSON protocol.

pub mod commands;
pub mod components;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod monitor;
pub mod progress;
pub mod stop;
pub mod tui;
pub mod watcher;
pub mod worker;

pub use error::MonitorError;
pub use progress::{calculate_progress, ProgressState};
pub use stop::StopSignal;

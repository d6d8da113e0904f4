//! Progress calculation and reporting.

use colored::Colorize;
use serde::Serialize;

/// Convert a produced/expected count pair into a whole percentage.
///
/// Rounds down, so 100 is only reported once `current >= total`. A `total`
/// of zero yields 0 instead of dividing by zero.
pub fn calculate_progress(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = current.saturating_mul(100) / total;
    percent.min(100) as u8
}

/// Snapshot of build progress, recomputed on every qualifying event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    pub percent: u8,
}

impl ProgressState {
    pub fn compute(current: u64, total: u64) -> Self {
        Self {
            current,
            total,
            percent: calculate_progress(current, total),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Receives progress from a simple-mode watch.
pub trait ProgressReporter {
    fn progress(&mut self, state: &ProgressState);
    fn complete(&mut self);
}

/// Prints progress lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn progress(&mut self, state: &ProgressState) {
        println!("Build Progress: {}%", state.percent.to_string().bold());
    }

    fn complete(&mut self) {
        println!("\n {}", "All the pages have been built.".green());
    }
}

/// Sends progress to the tracing log instead of the terminal.
///
/// Used when the worker cannot be started and progress must stay visible
/// without a display.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn progress(&mut self, state: &ProgressState) {
        tracing::info!(
            current = state.current,
            total = state.total,
            "Build progress: {}%",
            state.percent
        );
    }

    fn complete(&mut self) {
        tracing::info!("All the pages have been built");
    }
}

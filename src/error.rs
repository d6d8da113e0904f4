//! Error types for the monitoring core.
//!
//! Application-level code (commands, config loading) uses `anyhow`; the
//! monitor itself reports these typed errors so callers can decide which
//! failures are recoverable.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while watching build output or talking to the worker.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The target path does not exist (yet).
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading a directory failed for a reason other than absence.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A filesystem watch could not be created or attached.
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The worker sent something that is not a protocol message.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The worker process could not be started or exited unexpectedly.
    #[error("Worker process error: {0}")]
    Process(String),

    /// The stop signal fired (deadline or cancellation) before completion.
    #[error("Stopped while waiting for {}", .0.display())]
    Stopped(PathBuf),
}

impl MonitorError {
    /// Map an I/O error on `path`, turning `ErrorKind::NotFound` into [`MonitorError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            MonitorError::NotFound(path)
        } else {
            MonitorError::Io { path, source }
        }
    }

    /// Whether the error can be resolved by waiting for the path to appear.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MonitorError::NotFound(_))
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;

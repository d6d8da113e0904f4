//! Log output routing.
//!
//! Logs normally go to stderr. While a terminal worker owns the display, a
//! [`SessionLog`] guard routes them into a file instead so nothing is drawn
//! over the worker's UI. Dropping the guard restores stderr.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Name of the directory (under the system temp dir) holding session logs.
pub const LOG_DIR_NAME: &str = "evidence-logs";

/// File name of the session log inside the log directory.
pub const LOG_FILE_NAME: &str = "stdout.log";

/// Default log directory: `<tmp>/evidence-logs`.
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_NAME)
}

/// Shared, switchable log destination. Cheap to clone.
#[derive(Clone, Default)]
pub struct LogSink {
    file: Arc<Mutex<Option<File>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        // A panic mid-write leaves the file usable
        self.file.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether logs currently go to a file.
    pub fn is_redirected(&self) -> bool {
        self.lock().is_some()
    }

    /// Route log output into `path` (truncated) until the guard drops.
    pub fn redirect_to_file(&self, path: &Path) -> io::Result<SessionLog> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        writeln!(
            file,
            "--- pagewatch session started {} ---",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        *self.lock() = Some(file);
        Ok(SessionLog {
            sink: self.clone(),
            path: path.to_path_buf(),
        })
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { sink: self.clone() }
    }
}

pub struct SinkWriter {
    sink: LogSink,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.sink.lock().as_mut() {
            Some(file) => file.write(buf),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.lock().as_mut() {
            Some(file) => file.flush(),
            None => io::stderr().flush(),
        }
    }
}

/// Scoped redirection of log output into the session log file.
pub struct SessionLog {
    sink: LogSink,
    path: PathBuf,
}

impl SessionLog {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A handle onto the log file for a child process's stdio.
    pub fn child_stdio(&self) -> io::Result<Stdio> {
        match self.sink.lock().as_ref() {
            Some(file) => Ok(Stdio::from(file.try_clone()?)),
            None => Ok(Stdio::inherit()),
        }
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        if let Some(mut file) = self.sink.lock().take() {
            let _ = file.flush();
        }
    }
}

/// Install the global tracing subscriber writing through `sink`.
///
/// `RUST_LOG` takes precedence over `verbosity` (0 = warn, 1 = info, 2+ = debug).
pub fn init_tracing(sink: LogSink, verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(sink)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}

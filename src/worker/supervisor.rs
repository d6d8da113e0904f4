//! Lifecycle of the terminal worker process.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixListener;
use tokio::process::{Child, Command};

use super::link::{PendingPolicy, WorkerLink, WorkerState};
use super::protocol::{decode_inbound, Inbound, MessageReader, SOCKET_ENV};
use crate::error::{MonitorError, Result};
use crate::logging::{LogSink, SessionLog};

/// Executable name of the bundled terminal worker.
pub const WORKER_BINARY: &str = "pagewatch-tui";

/// Time allowed for the worker to restore the terminal after SIGTERM.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Find the worker executable.
///
/// Order: the configured path, a `pagewatch-tui` next to the current
/// executable, then `PATH`.
pub fn resolve_worker(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.is_file().then(|| path.to_path_buf());
    }

    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(WORKER_BINARY)));
    if let Some(sibling) = sibling.filter(|p| p.is_file()) {
        return Some(sibling);
    }

    which::which(WORKER_BINARY).ok()
}

/// Everything needed to launch a worker session.
pub struct WorkerLaunch<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    /// Directory for the IPC socket and the session log.
    pub runtime_dir: &'a Path,
    pub log_path: &'a Path,
    /// Watch-directory labels offered in the worker's menu.
    pub labels: Vec<String>,
    pub policy: PendingPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Message(Inbound),
    /// A line that is not a protocol message. Never fatal.
    Violation(String),
    /// The worker is gone; carries its exit code when it exited normally.
    Exited(Option<i32>),
}

pub struct WorkerSupervisor {
    child: Child,
    link: WorkerLink<OwnedWriteHalf>,
    /// Held until the worker connects
    listener: Option<UnixListener>,
    reader: Option<MessageReader<OwnedReadHalf>>,
    socket_path: PathBuf,
    exit_code: Option<Option<i32>>,
    // Declared last so it drops after the child
    session_log: SessionLog,
}

fn remove_socket(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MonitorError::from_io(path, e)),
    }
}

impl WorkerSupervisor {
    /// Launch the worker. The connection is accepted by [`next_event`].
    ///
    /// Logging is routed into the session log before the worker starts, as
    /// the worker owns the terminal from then on. Updates forwarded before
    /// the worker is ready go through the pending policy.
    ///
    /// [`next_event`]: WorkerSupervisor::next_event
    pub fn spawn(launch: WorkerLaunch<'_>, sink: &LogSink) -> Result<Self> {
        fs::create_dir_all(launch.runtime_dir)
            .map_err(|e| MonitorError::from_io(launch.runtime_dir, e))?;

        let socket_path = launch
            .runtime_dir
            .join(format!("worker-{}.sock", std::process::id()));
        remove_socket(&socket_path)?;

        let listener =
            UnixListener::bind(&socket_path).map_err(|e| MonitorError::from_io(&socket_path, e))?;

        let session_log = sink
            .redirect_to_file(launch.log_path)
            .map_err(|e| MonitorError::from_io(launch.log_path, e))?;
        let stderr = session_log
            .child_stdio()
            .unwrap_or_else(|_| Stdio::null());

        let child = Command::new(launch.program)
            .args(launch.args)
            .env(SOCKET_ENV, &socket_path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let _ = fs::remove_file(&socket_path);
                MonitorError::Process(format!(
                    "failed to start {}: {e}",
                    launch.program.display()
                ))
            })?;

        tracing::info!(pid = child.id(), "Spawned worker {}", launch.program.display());

        Ok(Self {
            child,
            link: WorkerLink::new(launch.labels, launch.policy),
            listener: Some(listener),
            reader: None,
            socket_path,
            exit_code: None,
            session_log,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.link.state()
    }

    pub fn session_log_path(&self) -> &Path {
        self.session_log.path()
    }

    fn record_exit(&mut self, status: std::io::Result<std::process::ExitStatus>) -> WorkerEvent {
        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!("Failed to wait for worker: {e}");
                None
            }
        };

        self.link.close();
        self.reader = None;
        self.listener = None;
        self.exit_code = Some(code);
        WorkerEvent::Exited(code)
    }

    /// Wait for the worker to connect, if it has not yet.
    async fn accept(&mut self) -> std::result::Result<(), WorkerEvent> {
        let Some(listener) = self.listener.as_ref() else {
            return Ok(());
        };

        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            status = self.child.wait() => return Err(self.record_exit(status)),
        };

        match accepted {
            Ok((stream, _addr)) => {
                tracing::debug!("Worker connected");
                let (read_half, write_half) = stream.into_split();
                self.reader = Some(MessageReader::new(read_half));
                self.link.connect(write_half);
                self.listener = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to accept worker connection: {e}");
                let _ = self.child.start_kill();
                let status = self.child.wait().await;
                Err(self.record_exit(status))
            }
        }
    }

    /// Wait for the next thing the worker does. Cancel safe.
    pub async fn next_event(&mut self) -> WorkerEvent {
        if let Some(code) = self.exit_code {
            return WorkerEvent::Exited(code);
        }
        if let Err(exited) = self.accept().await {
            return exited;
        }

        let closed = match self.reader.as_mut() {
            Some(reader) => tokio::select! {
                line = reader.next_line() => match line {
                    Ok(Some(line)) => match decode_inbound(&line) {
                        Ok(inbound) => return WorkerEvent::Message(inbound),
                        Err(e) => return WorkerEvent::Violation(e.to_string()),
                    },
                    // The socket closed; the process is on its way out
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!("Failed to read from worker: {e}");
                        None
                    }
                },
                status = self.child.wait() => Some(status),
            },
            None => None,
        };

        let status = match closed {
            Some(status) => status,
            None => self.child.wait().await,
        };
        self.record_exit(status)
    }

    pub async fn handle(&mut self, inbound: Inbound) -> Result<()> {
        self.link.handle(inbound).await
    }

    pub async fn forward(&mut self, count: usize, dir: String) -> Result<()> {
        self.link.forward(count, dir).await
    }

    /// Ask the worker to exit, then force it if it does not.
    pub async fn shutdown(mut self) {
        self.link.close();

        if self.exit_code.is_none() {
            if let Some(pid) = self.child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
            match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
                Ok(Ok(status)) => tracing::debug!("Worker exited with {status}"),
                _ => {
                    tracing::warn!("Worker did not exit within {:?}, killing it", SHUTDOWN_GRACE);
                    let _ = self.child.kill().await;
                }
            }
        }
    }
}

impl Drop for WorkerSupervisor {
    fn drop(&mut self) {
        let _ = remove_socket(&self.socket_path);
    }
}

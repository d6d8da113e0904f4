//! Readiness handshake and ordered delivery to the worker.

use std::collections::VecDeque;
use tokio::io::AsyncWrite;

use super::protocol::{menu_entries, Inbound, Message, MessageWriter};
use crate::error::{MonitorError, Result};

/// Default number of updates held back while the worker is not ready.
pub const DEFAULT_PENDING_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Process launched, IPC connection not yet established.
    Spawned,
    /// Connected, waiting for `childReady`.
    AwaitingReady,
    /// Handshake done; config sent.
    Ready,
    /// Process gone or session over; nothing is sent any more.
    Closed,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Spawned => write!(f, "Spawned"),
            WorkerState::AwaitingReady => write!(f, "AwaitingReady"),
            WorkerState::Ready => write!(f, "Ready"),
            WorkerState::Closed => write!(f, "Closed"),
        }
    }
}

/// What happens to data updates produced before the worker is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Queue them and flush after the config message. When full, the oldest
    /// update is discarded.
    Buffer { capacity: usize },
    /// Discard them.
    Drop,
}

impl Default for PendingPolicy {
    fn default() -> Self {
        PendingPolicy::Buffer {
            capacity: DEFAULT_PENDING_CAPACITY,
        }
    }
}

/// Monitor side of an established worker connection.
///
/// Guarantees that `config` is the first message the worker receives and
/// that it is only sent after `childReady`.
pub struct WorkerLink<W> {
    /// Present from the moment the worker connects until the link closes
    writer: Option<MessageWriter<W>>,
    state: WorkerState,
    labels: Vec<String>,
    pending: VecDeque<Message>,
    policy: PendingPolicy,
    dropped: usize,
}

impl<W: AsyncWrite + Unpin> WorkerLink<W> {
    /// A link for a worker that has been launched but has not connected.
    pub fn new(labels: Vec<String>, policy: PendingPolicy) -> Self {
        Self {
            writer: None,
            state: WorkerState::Spawned,
            labels,
            pending: VecDeque::new(),
            policy,
            dropped: 0,
        }
    }

    /// A link whose worker is already connected.
    pub fn connected(writer: W, labels: Vec<String>, policy: PendingPolicy) -> Self {
        let mut link = Self::new(labels, policy);
        link.connect(writer);
        link
    }

    /// The worker connected; wait for its `childReady`.
    pub fn connect(&mut self, writer: W) {
        if self.state == WorkerState::Spawned {
            self.writer = Some(MessageWriter::new(writer));
            self.state = WorkerState::AwaitingReady;
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Updates discarded because the worker was not ready.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    async fn send(&mut self, message: &Message) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(MonitorError::Process("worker is not connected".to_string()));
        };
        if let Err(e) = writer.send(message).await {
            self.close();
            return Err(MonitorError::Process(format!("failed to write to worker: {e}")));
        }
        Ok(())
    }

    /// React to a message from the worker.
    pub async fn handle(&mut self, inbound: Inbound) -> Result<()> {
        match inbound {
            Inbound::ChildReady => match self.state {
                WorkerState::Spawned => tracing::warn!("Ignoring childReady before connection"),
                WorkerState::AwaitingReady => {
                    self.state = WorkerState::Ready;
                    tracing::debug!("Worker ready, sending config");

                    let config = Message::Config {
                        config_array: menu_entries(&self.labels),
                    };
                    self.send(&config).await?;

                    while let Some(message) = self.pending.pop_front() {
                        self.send(&message).await?;
                    }
                }
                WorkerState::Ready => tracing::debug!("Ignoring repeated childReady"),
                WorkerState::Closed => {}
            },
            Inbound::Info { kind, result } => {
                tracing::info!(kind = %kind, result = %result, "Message from worker");
            }
        }
        Ok(())
    }

    /// Deliver a directory count, subject to the readiness state.
    pub async fn forward(&mut self, count: usize, dir: String) -> Result<()> {
        let message = Message::DataFromParent { count, dir };
        match self.state {
            WorkerState::Ready => self.send(&message).await,
            WorkerState::Spawned | WorkerState::AwaitingReady => {
                match self.policy {
                    PendingPolicy::Buffer { capacity } => {
                        if self.pending.len() >= capacity.max(1) {
                            self.pending.pop_front();
                            self.dropped += 1;
                            tracing::warn!(
                                "Worker not ready and buffer full, discarding oldest update"
                            );
                        }
                        self.pending.push_back(message);
                    }
                    PendingPolicy::Drop => {
                        self.dropped += 1;
                        tracing::debug!("Worker not ready, dropping update");
                    }
                }
                Ok(())
            }
            WorkerState::Closed => Ok(()),
        }
    }

    pub fn close(&mut self) {
        self.state = WorkerState::Closed;
        self.writer = None;
        self.pending.clear();
    }
}

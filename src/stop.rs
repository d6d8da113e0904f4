//! Externally supplied deadline and cancellation for long waits.
//!
//! Nothing in the monitor times out on its own. Callers that need a bound
//! pass a [`StopSignal`] carrying a deadline, a cancellation handle, or both.

use std::future::pending;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a [`StopSignal`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Deadline,
    Cancelled,
}

/// Deadline and/or cancellation observed by waits and session loops.
///
/// The default signal never fires.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    deadline: Option<Instant>,
    cancelled: Option<watch::Receiver<bool>>,
}

/// Sending half of a cancellable [`StopSignal`].
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

impl StopSignal {
    pub fn never() -> Self {
        Self::default()
    }

    /// Create a signal that fires when the returned handle is stopped.
    pub fn cancellable() -> (StopHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            StopHandle { tx },
            Self {
                deadline: None,
                cancelled: Some(rx),
            },
        )
    }

    /// Add a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_optional_timeout(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => self.with_timeout(t),
            None => self,
        }
    }

    /// Check without waiting.
    pub fn is_stopped(&self) -> bool {
        if self.deadline.is_some_and(|at| Instant::now() >= at) {
            return true;
        }
        self.cancelled.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the deadline passes or the handle is stopped.
    ///
    /// Pends forever for [`StopSignal::never`]. A dropped handle never cancels.
    pub async fn stopped(&self) -> StopReason {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => pending::<()>().await,
            }
        };

        let mut cancelled_rx = self.cancelled.clone();
        let cancelled = async {
            match cancelled_rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow_and_update() {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        pending::<()>().await;
                    }
                },
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            _ = deadline => StopReason::Deadline,
            _ = cancelled => StopReason::Cancelled,
        }
    }
}

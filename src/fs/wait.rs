use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::error::{MonitorError, Result};
use crate::stop::StopSignal;

/// Default interval between existence checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Suspend until `path` exists.
///
/// Polls on a fixed interval. There is no built-in timeout; the wait ends
/// early only when `stop` fires, yielding [`MonitorError::Stopped`].
pub async fn wait_for_existence(
    path: &Path,
    poll_interval: Duration,
    stop: &StopSignal,
) -> Result<()> {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut logged = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tokio::fs::try_exists(path).await.unwrap_or(false) {
                    if logged {
                        tracing::debug!("{} appeared", path.display());
                    }
                    return Ok(());
                }
                if !logged {
                    tracing::debug!("Waiting for {} to be created", path.display());
                    logged = true;
                }
            }
            reason = stop.stopped() => {
                tracing::debug!(?reason, "Stopped waiting for {}", path.display());
                return Err(MonitorError::Stopped(path.to_path_buf()));
            }
        }
    }
}

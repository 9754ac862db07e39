// ── Background polling ──
//
// Scoped handle around the periodic refresh task. Stopping (or dropping)
// the handle cancels the timer; nothing else needs releasing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::NotificationStore;

/// Keeps a zero or near-zero interval from turning into a busy loop.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owner of a running poll loop.
///
/// Dropping the handle cancels the loop. A poll already on the wire runs
/// to completion but its listing is no longer applied to the mirror.
/// [`stop`](Self::stop) also waits for the task to finish.
#[must_use = "dropping a PollHandle stops polling immediately"]
pub struct PollHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Token that cancels this loop; useful for tying it to a wider shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "notification poll task ended abnormally");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl NotificationStore {
    /// Start polling: fetch now, then every `poll_interval`.
    ///
    /// Failed polls are logged and the loop keeps going. Must be called
    /// inside a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> PollHandle {
        let period = self.config().poll_interval.max(MIN_POLL_INTERVAL);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_task(Arc::clone(self), period, cancel.clone()));

        info!(interval_ms = period.as_millis(), "notification polling started");
        PollHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Refresh on every tick until cancelled. The first tick fires immediately.
async fn poll_task(store: Arc<NotificationStore>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("polling notifications");
                if let Err(e) = store.poll_until_cancelled(&cancel).await {
                    warn!(error = %e, "periodic notification refresh failed");
                }
            }
        }
    }

    info!("notification polling stopped");
}

// ── Notification store ──
//
// Eventually consistent mirror of one user's notifications. Polls go
// through a `RequestController`; optimistic edits mutate the mirror
// directly and confirm with the server in the background.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crmsync_api::{
    ErrorInfo, MessageResponse, Notification, NotificationCreate, NotificationsApi, Transport,
};

use crate::mirror::NotificationMirror;
use crate::request::{RequestController, RequestState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_LIMIT: u32 = 50;

// ── StoreConfig ──────────────────────────────────────────────────

/// Polling parameters for a [`NotificationStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub poll_interval: Duration,
    /// Forwarded as `unread_only` on every list call.
    pub unread_only: bool,
    /// Forwarded as `limit` on every list call.
    pub limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            unread_only: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

// ── Confirmation ─────────────────────────────────────────────────

/// Server confirmation of an optimistic edit, running as a spawned task.
///
/// The local change is already applied when this is returned. Dropping it
/// leaves the task running (fire-and-forget); awaiting it yields the
/// server's answer. A failure never rolls the local change back.
#[must_use = "dropping a Confirmation detaches it; await it to observe the server result"]
pub struct Confirmation<T> {
    task: JoinHandle<Result<T, ErrorInfo>>,
}

impl<T> Future for Confirmation<T> {
    type Output = Result<T, ErrorInfo>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(ErrorInfo::new(
                    format!("confirmation task failed: {e}"),
                    "TASK_ABORTED",
                    0,
                ))
            })
        })
    }
}

// ── NotificationStore ────────────────────────────────────────────

/// Local notification mirror kept in step with the server by polling.
///
/// Each successful poll replaces the mirror wholesale. Optimistic edits
/// made while a poll is in flight are overwritten when that poll lands;
/// the next poll carries the server's view of them.
pub struct NotificationStore {
    api: NotificationsApi,
    config: StoreConfig,
    fetch: RequestController<(), Vec<Notification>>,
    mirror: watch::Sender<Arc<NotificationMirror>>,
    confirmation_error: Arc<watch::Sender<Option<ErrorInfo>>>,
}

impl NotificationStore {
    pub fn new(transport: Arc<dyn Transport>, config: StoreConfig) -> Self {
        let api = NotificationsApi::new(transport);

        let fetch = {
            let api = api.clone();
            let (unread_only, limit) = (config.unread_only, config.limit);
            RequestController::new(move |()| {
                let api = api.clone();
                async move { api.list(unread_only, limit).await }
            })
        };

        let (mirror, _) = watch::channel(Arc::new(NotificationMirror::new()));
        let (confirmation_error, _) = watch::channel(None);

        Self {
            api,
            config,
            fetch,
            mirror,
            confirmation_error: Arc::new(confirmation_error),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn api(&self) -> &NotificationsApi {
        &self.api
    }

    // ── Observation ──────────────────────────────────────────────

    /// Current mirror snapshot (cheap `Arc` clone).
    pub fn mirror(&self) -> Arc<NotificationMirror> {
        self.mirror.borrow().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.mirror.borrow().to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.mirror.borrow().unread_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<NotificationMirror>> {
        self.mirror.subscribe()
    }

    /// Mirror snapshots as a `Stream`, starting with the current one.
    pub fn mirror_stream(&self) -> WatchStream<Arc<NotificationMirror>> {
        WatchStream::new(self.mirror.subscribe())
    }

    /// Lifecycle of the list call.
    pub fn fetch_state(&self) -> RequestState<Vec<Notification>> {
        self.fetch.state()
    }

    pub fn subscribe_fetch(&self) -> watch::Receiver<RequestState<Vec<Notification>>> {
        self.fetch.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_loading()
    }

    /// Error from the most recent poll, if it failed.
    pub fn error(&self) -> Option<ErrorInfo> {
        self.fetch.error()
    }

    /// Most recent failure of a mark-read / mark-all confirmation.
    pub fn last_confirmation_error(&self) -> Option<ErrorInfo> {
        self.confirmation_error.borrow().clone()
    }

    pub fn clear_confirmation_error(&self) {
        self.confirmation_error.send_replace(None);
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one poll. On success the mirror becomes exactly the fetched list.
    ///
    /// On failure the mirror is left as it was and the error is both
    /// returned and exposed through [`error`](Self::error).
    pub async fn refresh(&self) -> Result<usize, ErrorInfo> {
        self.poll_unless(None).await
    }

    /// One poll on behalf of the background loop. A listing that arrives
    /// after `cancel` fired is dropped instead of replacing the mirror.
    pub(crate) async fn poll_until_cancelled(
        &self,
        cancel: &CancellationToken,
    ) -> Result<usize, ErrorInfo> {
        self.poll_unless(Some(cancel)).await
    }

    async fn poll_unless(&self, cancel: Option<&CancellationToken>) -> Result<usize, ErrorInfo> {
        match self.fetch.execute(()).await {
            Ok(items) => {
                let count = items.len();
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    debug!(count, "polling stopped while fetching; listing discarded");
                    return Ok(count);
                }
                self.mirror.send_modify(|m| Arc::make_mut(m).replace(items));
                debug!(count, unread = self.unread_count(), "notifications refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, code = %e.code, "notification poll failed; keeping stale mirror");
                Err(e)
            }
        }
    }

    // ── Optimistic edits ─────────────────────────────────────────

    /// Mark one notification read locally, then confirm with the server.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn mark_as_read(&self, id: i64) -> Confirmation<Notification> {
        let flipped = self.mutate(|m| m.mark_read(id));
        debug!(id, flipped, "marked notification read locally");

        let api = self.api.clone();
        self.confirm("mark-read", async move { api.mark_as_read(id).await })
    }

    /// Mark everything read locally, then confirm with the server.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn mark_all_as_read(&self) -> Confirmation<MessageResponse> {
        let flipped = self.mutate(NotificationMirror::mark_all_read);
        debug!(flipped, "marked all notifications read locally");

        let api = self.api.clone();
        self.confirm("mark-all-read", async move { api.mark_all_as_read().await })
    }

    /// Prepend a notification (e.g. one pushed by another channel).
    pub fn add_notification(&self, notification: Notification) {
        debug!(id = notification.id, "adding notification locally");
        self.mutate(|m| m.add(notification));
    }

    /// Drop a notification from the mirror. Local only.
    pub fn remove_notification(&self, id: i64) -> Option<Notification> {
        let removed = self.mutate(|m| m.remove(id));
        debug!(id, found = removed.is_some(), "removed notification locally");
        removed
    }

    /// Create a notification on the server and prepend the stored copy.
    ///
    /// Not optimistic: the id is assigned by the server.
    pub async fn create(&self, data: &NotificationCreate) -> Result<Notification, ErrorInfo> {
        let created = self.api.create(data).await?;
        self.add_notification(created.clone());
        Ok(created)
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Apply `f` to the mirror and notify subscribers, atomically.
    fn mutate<R: Default>(&self, f: impl FnOnce(&mut NotificationMirror) -> R) -> R {
        let mut out = R::default();
        self.mirror.send_modify(|m| out = f(Arc::make_mut(m)));
        out
    }

    fn confirm<T, Fut>(&self, op: &'static str, call: Fut) -> Confirmation<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        let errors = Arc::clone(&self.confirmation_error);
        let task = tokio::spawn(async move {
            let result = call.await;
            if let Err(ref e) = result {
                warn!(op, error = %e, "server rejected optimistic update; keeping local change");
                errors.send_replace(Some(e.clone()));
            }
            result
        });
        Confirmation { task }
    }
}

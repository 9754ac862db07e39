// crmsync-core: Request lifecycle tracking and the polled notification store.

pub mod mirror;
pub mod poller;
pub mod request;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use mirror::NotificationMirror;
pub use poller::{MIN_POLL_INTERVAL, PollHandle};
pub use request::{RequestController, RequestState, SettlePolicy};
pub use store::{
    Confirmation, DEFAULT_LIMIT, DEFAULT_POLL_INTERVAL, NotificationStore, StoreConfig,
};

// Wire types consumers need alongside the store.
pub use crmsync_api::{ErrorInfo, Notification, NotificationCreate, Transport};

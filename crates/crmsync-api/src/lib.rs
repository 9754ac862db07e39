// crmsync-api: HTTP transport and notification endpoints for the crmsync backend

pub mod error;
pub mod http;
pub mod models;
pub mod notifications;
pub mod transport;

pub use error::{Error, ErrorInfo};
pub use http::{AuthFailureHook, HttpTransport};
pub use models::{MessageResponse, Notification, NotificationCreate};
pub use notifications::NotificationsApi;
pub use transport::{DEFAULT_TIMEOUT, Query, Transport, TransportConfig, TransportExt};

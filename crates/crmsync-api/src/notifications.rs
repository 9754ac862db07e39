// Notification endpoints
//
// Thin typed wrapper over an injected `Transport`. Holds no state of its own.

use std::sync::Arc;

use tracing::debug;

use crate::error::ErrorInfo;
use crate::models::{MessageResponse, Notification, NotificationCreate};
use crate::transport::{Transport, TransportExt};

const BASE: &str = "/api/notifications";

/// Endpoint service for `/api/notifications`.
#[derive(Clone)]
pub struct NotificationsApi {
    transport: Arc<dyn Transport>,
}

impl NotificationsApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// List the current user's notifications.
    ///
    /// `GET /api/notifications?unread_only={bool}&limit={n}`
    pub async fn list(&self, unread_only: bool, limit: u32) -> Result<Vec<Notification>, ErrorInfo> {
        debug!(unread_only, limit, "listing notifications");
        self.transport
            .get_json(
                BASE,
                &[
                    ("unread_only", unread_only.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await
    }

    /// Create a notification. The server assigns the id.
    ///
    /// `POST /api/notifications`
    pub async fn create(&self, data: &NotificationCreate) -> Result<Notification, ErrorInfo> {
        debug!(user_id = data.user_id, "creating notification");
        self.transport.post_json(BASE, Some(data)).await
    }

    /// `POST /api/notifications/{id}/read`
    pub async fn mark_as_read(&self, id: i64) -> Result<Notification, ErrorInfo> {
        debug!(id, "marking notification read");
        self.transport
            .post_json::<_, ()>(&format!("{BASE}/{id}/read"), None)
            .await
    }

    /// `POST /api/notifications/mark-all-read`
    pub async fn mark_all_as_read(&self) -> Result<MessageResponse, ErrorInfo> {
        debug!("marking all notifications read");
        self.transport
            .post_json::<_, ()>(&format!("{BASE}/mark-all-read"), None)
            .await
    }

    /// Delete read notifications older than `days`. Superuser only.
    ///
    /// `DELETE /api/notifications/cleanup?days={n}`
    pub async fn cleanup(&self, days: u32) -> Result<MessageResponse, ErrorInfo> {
        debug!(days, "cleaning up notifications");
        self.transport
            .delete_json(&format!("{BASE}/cleanup"), &[("days", days.to_string())])
            .await
    }
}

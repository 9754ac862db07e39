//! One-shot notification command handlers.

use std::sync::Arc;

use chrono::Local;
use tabled::Tabled;

use crmsync_api::{HttpTransport, Notification, NotificationCreate};
use crmsync_config::Config;
use crmsync_core::{NotificationStore, StoreConfig};

use crate::cli::{CreateArgs, GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "")]
    unread: String,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            unread: output::unread_marker(n.is_unread()),
            id: n.id,
            kind: n.kind.clone(),
            title: n.title.clone(),
            created: format_time(n),
        }
    }
}

fn format_time(n: &Notification) -> String {
    n.created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn detail(n: &Notification) -> String {
    format!(
        "#{} [{}] {}\n{}\n{} ({})",
        n.id,
        n.kind,
        n.title,
        n.content,
        format_time(n),
        if n.read { "read" } else { "unread" },
    )
}

// ── Helpers ─────────────────────────────────────────────────────────

pub(crate) fn open_store(transport: Arc<HttpTransport>, config: StoreConfig) -> NotificationStore {
    NotificationStore::new(transport, config)
}

/// Load the current page so optimistic edits have something to apply to.
async fn loaded_store(
    transport: Arc<HttpTransport>,
    config: &Config,
) -> Result<NotificationStore, CliError> {
    let store = open_store(transport, config.store_config());
    store.refresh().await?;
    Ok(store)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list(
    transport: Arc<HttpTransport>,
    config: &Config,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut store_config = config.store_config();
    store_config.unread_only |= args.unread_only;
    if let Some(limit) = args.limit {
        store_config.limit = limit;
    }

    let store = open_store(transport, store_config);
    store.refresh().await?;

    let items = store.notifications();
    let out = output::render_list(global.output, &items, |n| NotificationRow::from(n), |n| {
        n.id.to_string()
    })?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!("{} unread", store.unread_count());
    }
    Ok(())
}

pub async fn read(
    transport: Arc<HttpTransport>,
    config: &Config,
    id: i64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = loaded_store(transport, config).await?;
    if !store.mirror().contains(id) {
        tracing::debug!(id, "notification not in the current page; asking the server anyway");
    }

    let updated = store.mark_as_read(id).await?;
    let out = output::render_single(global.output, &updated, detail, |n| n.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn read_all(
    transport: Arc<HttpTransport>,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = loaded_store(transport, config).await?;
    let cleared = store.unread_count();

    let response = store.mark_all_as_read().await?;
    let out = output::render_single(global.output, &response, |r| r.message.clone(), |_| {
        cleared.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn create(
    transport: Arc<HttpTransport>,
    config: &Config,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = open_store(transport, config.store_config());
    let data = NotificationCreate {
        user_id: args.user_id,
        kind: args.kind,
        title: args.title,
        content: args.content,
    };

    let created = store.create(&data).await?;
    let out = output::render_single(global.output, &created, detail, |n| n.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn cleanup(
    transport: Arc<HttpTransport>,
    config: &Config,
    days: u32,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = open_store(transport, config.store_config());
    let response = store.api().cleanup(days).await?;
    let out = output::render_single(global.output, &response, |r| r.message.clone(), |r| {
        r.message.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample(read: bool) -> Notification {
        Notification {
            id: 7,
            user_id: 1,
            kind: "in_app".into(),
            title: "Deal closed".into(),
            content: "Acme signed".into(),
            read,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            delivered_at: None,
        }
    }

    #[test]
    fn row_marks_only_unread() {
        assert!(NotificationRow::from(&sample(true)).unread.is_empty());
        assert!(!NotificationRow::from(&sample(false)).unread.is_empty());
    }

    #[test]
    fn detail_shows_read_state() {
        let text = detail(&sample(false));
        assert!(text.starts_with("#7 [in_app] Deal closed"));
        assert!(text.ends_with("(unread)"));
    }
}

//! `crmsync watch`: poll in the background and report unread-count changes.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio_stream::StreamExt;

use crmsync_api::HttpTransport;
use crmsync_config::Config;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::notifications::open_store;

pub async fn handle(
    transport: Arc<HttpTransport>,
    config: &Config,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut store_config = config.store_config();
    store_config.unread_only |= args.unread_only;
    if let Some(secs) = args.interval {
        store_config.poll_interval = Duration::from_secs(secs);
    }

    let store = Arc::new(open_store(transport, store_config));
    let mut fetches = store.subscribe_fetch();
    let mut mirrors = store.mirror_stream();
    let handle = store.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last: Option<usize> = None;
    let mut last_error = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(mirror) = mirrors.next() => {
                let unread = mirror.unread_count();
                if last != Some(unread) {
                    last = Some(unread);
                    output::print_output(&unread_line(unread, mirror.len()), global.quiet);
                }
            }
            Ok(()) = fetches.changed() => {
                let error = fetches.borrow_and_update().error().cloned();
                if error != last_error {
                    if let Some(ref e) = error {
                        eprintln!("{} {e} ({})", "poll failed:".red().bold(), e.code);
                    }
                    last_error = error;
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn unread_line(unread: usize, total: usize) -> String {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    if output::should_color() && unread > 0 {
        format!("{stamp} {} unread of {total}", unread.bold().cyan())
    } else {
        format!("{stamp} {unread} unread of {total}")
    }
}

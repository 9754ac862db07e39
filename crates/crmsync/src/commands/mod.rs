//! Command dispatch: bridges CLI args -> notification store -> output formatting.

pub mod config_cmd;
pub mod notifications;
pub mod watch;

use std::sync::Arc;

use crmsync_api::HttpTransport;
use crmsync_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a network-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    transport: Arc<HttpTransport>,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => notifications::list(transport, config, &args, global).await,
        Command::Read { id } => notifications::read(transport, config, id, global).await,
        Command::ReadAll => notifications::read_all(transport, config, global).await,
        Command::Create(args) => notifications::create(transport, config, args, global).await,
        Command::Cleanup { days } => notifications::cleanup(transport, config, days, global).await,
        Command::Watch(args) => watch::handle(transport, config, &args, global).await,
        // Config is handled before dispatch
        Command::Config => unreachable!(),
    }
}

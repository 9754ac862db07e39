mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crmsync_api::{AuthFailureHook, HttpTransport};
use crmsync_config::Config;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli.global)?;

    match cli.command {
        // Config display never touches the network
        Command::Config => commands::config_cmd::handle(&config, &cli.global),

        cmd => {
            let transport = Arc::new(build_transport(&config)?);
            tracing::debug!(command = ?cmd, api_url = %config.api_url, "dispatching command");
            commands::dispatch(cmd, transport, &config, &cli.global).await
        }
    }
}

/// File + env config, then CLI flag overrides.
fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = crmsync_config::load_config()?;
    if let Some(ref url) = global.api_url {
        config.api_url.clone_from(url);
    }
    if let Some(ref token) = global.token {
        config.token = Some(token.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_transport(config: &Config) -> Result<HttpTransport, CliError> {
    // A CLI has no login page to send the user to; say so once on stderr.
    let hook = AuthFailureHook::new(|| {
        eprintln!("{} session expired, log in again", "auth:".yellow().bold());
    });
    let transport = HttpTransport::new(config.api_url()?, &config.transport_config(), hook)
        .map_err(|e| CliError::from(crmsync_api::ErrorInfo::from(e)))?;
    if let Some(token) = config.token() {
        transport.set_token(token);
    }
    Ok(transport)
}

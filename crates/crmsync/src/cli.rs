//! Clap derive structures for the `crmsync` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// crmsync -- notification inbox for the CRM API
#[derive(Debug, Parser)]
#[command(
    name = "crmsync",
    version,
    about = "Read and manage CRM notifications from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API base URL (overrides config)
    #[arg(long, env = "CRMSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for this session
    #[arg(long, env = "CRMSYNC_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List notifications
    #[command(alias = "ls")]
    List(ListArgs),

    /// Mark one notification as read
    Read {
        /// Notification id
        id: i64,
    },

    /// Mark every notification as read
    ReadAll,

    /// Create a notification
    Create(CreateArgs),

    /// Delete read notifications older than N days (superuser)
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Keep polling and print the unread count whenever it changes
    Watch(WatchArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only unread notifications
    #[arg(long)]
    pub unread_only: bool,

    /// Maximum number to fetch (defaults to config)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub user_id: i64,

    /// Channel: email, in_app, push
    #[arg(long = "type", default_value = "in_app")]
    pub kind: String,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub content: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (defaults to config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Only track unread notifications
    #[arg(long)]
    pub unread_only: bool,
}

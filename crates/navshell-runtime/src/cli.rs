//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use navshell_runtime::ConfigOverrides;

#[derive(Parser)]
#[command(name = "navshell", about = "Console navigation shell: announcement feed and panel coordinator")]
pub struct Cli {
    /// TOML config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Console API base URL (e.g. https://console.example.com/api/0)
    #[arg(long, global = true, env = "NAVSHELL_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the console API
    #[arg(long, global = true, env = "NAVSHELL_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the shell: poll the feed, read host events (JSON lines) from stdin,
    /// print status lines on change
    Run(RunOpts),
    /// Fetch announcements once and print them as JSON
    Fetch,
    /// Mark announcements as seen
    Ack(AckOpts),
}

#[derive(clap::Args, Default)]
pub struct RunOpts {
    /// Delay between a fetch settling and the next fetch, in milliseconds
    #[arg(long)]
    pub refresh_interval_ms: Option<u64>,

    /// Delay between opening the announcements panel and acknowledging, in milliseconds
    #[arg(long)]
    pub ack_delay_ms: Option<u64>,
}

#[derive(clap::Args)]
pub struct AckOpts {
    /// Announcement ids
    #[arg(required = true)]
    pub ids: Vec<String>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        let (refresh_interval_ms, ack_delay_ms) = match &self.command {
            Some(Command::Run(opts)) => (opts.refresh_interval_ms, opts.ack_delay_ms),
            _ => (None, None),
        };
        ConfigOverrides {
            api_url: self.api_url.clone(),
            api_token: self.api_token.clone(),
            refresh_interval_ms,
            ack_delay_ms,
        }
    }
}

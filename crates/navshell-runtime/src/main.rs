//! navshell: headless host for the console navigation shell.
//! Runs the announcement feed controller and panel coordinator against the
//! console API, driven by host events on stdin.

use anyhow::Context;
use clap::Parser;
use navshell_runtime::ShellConfig;

mod cli;
mod cmd_once;
mod cmd_run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("NAVSHELL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    config.apply(&args.overrides());
    config.validate().context("invalid configuration")?;

    match args.command {
        None | Some(cli::Command::Run(_)) => cmd_run::cmd_run(config).await?,
        Some(cli::Command::Fetch) => cmd_once::cmd_fetch(&config).await?,
        Some(cli::Command::Ack(opts)) => cmd_once::cmd_ack(&config, &opts.ids).await?,
    }

    Ok(())
}

//! `navshell run`: long-running shell host.
//!
//! Host events arrive as JSON lines on stdin, e.g.
//! `{"event":"toggle_panel","panel":"announcements"}`. A status line (JSON) is
//! printed to stdout whenever the snapshot or the open panel changes.

use navshell_runtime::{AnnouncementFeed, HostEvent, HostEvents, ShellConfig, ShellError, spawn_shell};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cmd_once::build_client;

pub async fn cmd_run(config: ShellConfig) -> anyhow::Result<()> {
    let client = build_client(&config)?;
    let feed = AnnouncementFeed::new(client, config.feed.clone());
    let shell = spawn_shell(feed, config.event_buffer);
    tracing::info!(api_url = %config.api_url, "navigation shell running");

    let mut snapshots = shell.feed().subscribe();
    let mut panels = shell.subscribe_panel();
    let mut stdin_task = tokio::spawn(pump_stdin(shell.events()));
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                snapshots.borrow_and_update();
                print_status(&shell.status())?;
            }
            changed = panels.changed() => {
                if changed.is_err() {
                    break;
                }
                panels.borrow_and_update();
                print_status(&shell.status())?;
            }
            _ = &mut stdin_task, if stdin_open => {
                stdin_open = false;
                tracing::info!("stdin closed; waiting for ctrl-c");
            }
        }
    }

    stdin_task.abort();
    shell.teardown().await;
    tracing::info!("navigation shell stopped");
    Ok(())
}

fn print_status(status: &navshell_runtime::ShellStatus) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(status)?);
    Ok(())
}

async fn pump_stdin(events: HostEvents) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: HostEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed host event");
                continue;
            }
        };
        if let Err(ShellError::TornDown) = events.send(event).await {
            return;
        }
    }
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("received ctrl-c, shutting down");
            }
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("received ctrl-c, shutting down");
    }

    Ok(())
}

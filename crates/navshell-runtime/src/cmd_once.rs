//! One-shot feed commands: `navshell fetch` and `navshell ack`.

use navshell_core::{AnnouncementId, FeedSnapshot};
use navshell_feed::{FeedClient, HttpFeedClient};
use navshell_runtime::ShellConfig;

pub fn build_client(config: &ShellConfig) -> anyhow::Result<HttpFeedClient> {
    Ok(HttpFeedClient::new(
        config.api_url.clone(),
        config.api_token.clone(),
        config.request_timeout(),
    )?)
}

pub async fn cmd_fetch(config: &ShellConfig) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let items = client.fetch_announcements().await?;
    let snapshot = FeedSnapshot::loaded(items, chrono::Utc::now());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub async fn cmd_ack(config: &ShellConfig, ids: &[String]) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let ids: Vec<AnnouncementId> = ids.iter().map(|id| AnnouncementId::new(id.as_str())).collect();
    client.acknowledge(&ids).await?;
    tracing::info!(count = ids.len(), "announcements marked seen");
    Ok(())
}

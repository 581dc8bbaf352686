//! Discord REST and webhook wire types.

use serde::{Deserialize, Serialize};

use super::config::{DiscordConfig, FETCH_TIMEOUT};
use crate::error::Result;
use crate::http::Fetcher;

/// Channel message as returned by `GET /channels/{id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub content: Option<String>,
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub username: String,
    pub bot: Option<bool>,
}

impl Author {
    pub fn is_bot(&self) -> bool {
        self.bot.unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Fetch the most recent messages, newest first.
pub async fn fetch_recent(fetcher: &Fetcher, config: &DiscordConfig) -> Result<Vec<DiscordMessage>> {
    let request = fetcher
        .get(&config.messages_url(), FETCH_TIMEOUT)
        .header("Authorization", config.authorization());
    fetcher.send_json(request).await
}

/// Post text through the webhook. Fire-and-forget.
pub fn send_webhook(fetcher: &Fetcher, config: &DiscordConfig, text: &str) {
    fetcher.post_json_detached(
        config.webhook_url.trim(),
        &WebhookPayload { content: text },
        "discord.webhook",
    );
}

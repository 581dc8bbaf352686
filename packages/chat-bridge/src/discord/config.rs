//! Discord bridge configuration.
//!
//! Outbound and inbound halves are enabled independently: the webhook URL
//! alone is enough to mirror game chat out, the bot token and channel id are
//! needed to poll messages back in.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::scheduler::effective_interval;

pub const POLL_FLOOR_SECS: u64 = 2;

pub const WARMUP: Duration = Duration::from_secs(2);

/// Number of most recent messages fetched per poll.
pub const FETCH_LIMIT: u32 = 5;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscordConfig {
    pub enabled: bool,
    pub webhook_url: String,
    pub bot_token: String,
    pub channel_id: String,
    pub poll_interval_seconds: u64,
    pub format_to_discord: String,
    pub format_from_discord: String,
    /// REST API base URL.
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            bot_token: String::new(),
            channel_id: String::new(),
            poll_interval_seconds: 5,
            format_to_discord: "[{type}] {player}: {message}".to_string(),
            format_from_discord: "&7[&9DC&7] &f{user}&7: &f{message}".to_string(),
            api_base: "https://discord.com/api/v10".to_string(),
        }
    }
}

impl DiscordConfig {
    /// Override credentials from `DISCORD_BOT_TOKEN`, `DISCORD_CHANNEL_ID`
    /// and `DISCORD_WEBHOOK_URL`.
    pub fn apply_env(&mut self) {
        if let Ok(token) = env::var("DISCORD_BOT_TOKEN") {
            self.bot_token = token;
        }
        if let Ok(channel) = env::var("DISCORD_CHANNEL_ID") {
            self.channel_id = channel;
        }
        if let Ok(url) = env::var("DISCORD_WEBHOOK_URL") {
            self.webhook_url = url;
        }
    }

    pub fn outbound_enabled(&self) -> bool {
        self.enabled && !self.webhook_url.trim().is_empty()
    }

    /// Check that inbound polling can run.
    pub fn validate_inbound(&self) -> Result<()> {
        if !self.enabled {
            return Err(BridgeError::Configuration("discord bridge disabled".into()));
        }
        if self.bot_token.trim().is_empty() {
            return Err(BridgeError::Configuration("discord bot-token is blank".into()));
        }
        if self.channel_id.trim().is_empty() {
            return Err(BridgeError::Configuration("discord channel-id is blank".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        effective_interval(POLL_FLOOR_SECS, self.poll_interval_seconds)
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/channels/{}/messages?limit={}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(self.channel_id.trim()),
            FETCH_LIMIT
        )
    }

    pub fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token.trim())
    }
}

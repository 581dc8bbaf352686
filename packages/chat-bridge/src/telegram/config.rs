//! Telegram bridge configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::scheduler::effective_interval;

/// Shortest allowed poll interval in seconds.
pub const POLL_FLOOR_SECS: u64 = 2;

/// Delay before the first poll after start.
pub const WARMUP: Duration = Duration::from_secs(1);

/// Server-side long-poll wait in seconds.
pub const LONG_POLL_SECS: u64 = 20;

/// Total timeout for a long-poll request (server wait plus slack).
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TelegramConfig {
    pub enabled: bool,
    /// Bot token issued by BotFather.
    pub token: String,
    /// Chat the bridge mirrors, as a decimal id.
    pub chat_id: String,
    pub poll_interval_seconds: u64,
    pub format_to_telegram: String,
    pub format_from_telegram: String,
    /// Bot API base URL.
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: String::new(),
            chat_id: String::new(),
            poll_interval_seconds: 5,
            format_to_telegram: "[{type}] {player}: {message}".to_string(),
            format_from_telegram: "&7[&dTG&7] &f{user}&7: &f{message}".to_string(),
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Override credentials from `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID`.
    pub fn apply_env(&mut self) {
        if let Ok(token) = env::var("TELEGRAM_TOKEN") {
            self.token = token;
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHAT_ID") {
            self.chat_id = chat_id;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Err(BridgeError::Configuration("telegram bridge disabled".into()));
        }
        if self.token.trim().is_empty() {
            return Err(BridgeError::Configuration("telegram token is blank".into()));
        }
        if self.chat_id.trim().is_empty() {
            return Err(BridgeError::Configuration("telegram chat-id is blank".into()));
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn poll_interval(&self) -> Duration {
        effective_interval(POLL_FLOOR_SECS, self.poll_interval_seconds)
    }

    fn bot_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token.trim(),
            method
        )
    }

    pub fn updates_url(&self, offset: i64) -> String {
        format!(
            "{}?timeout={}&offset={}",
            self.bot_url("getUpdates"),
            LONG_POLL_SECS,
            offset
        )
    }

    pub fn send_url(&self) -> String {
        self.bot_url("sendMessage")
    }
}

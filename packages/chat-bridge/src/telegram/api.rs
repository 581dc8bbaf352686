//! Telegram Bot API wire types and calls.

use serde::Deserialize;

use super::config::{TelegramConfig, LONG_POLL_TIMEOUT};
use crate::error::Result;
use crate::http::Fetcher;

/// Label used when a sender has no usable name.
pub const FALLBACK_USER: &str = "Telegram";

#[derive(Debug, Deserialize)]
pub struct UpdatesResponse {
    #[serde(default)]
    pub result: Vec<Update>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Option<Chat>,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// `@handle`, else the full name, else [`FALLBACK_USER`].
    pub fn label(user: Option<&User>) -> String {
        let Some(user) = user else {
            return FALLBACK_USER.to_string();
        };
        if let Some(handle) = user.username.as_deref().filter(|u| !u.trim().is_empty()) {
            return format!("@{}", handle);
        }
        let full = format!(
            "{} {}",
            user.first_name.as_deref().unwrap_or(""),
            user.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            FALLBACK_USER.to_string()
        } else {
            full.to_string()
        }
    }
}

/// Long-poll for updates starting at `offset`.
pub async fn fetch_updates(fetcher: &Fetcher, config: &TelegramConfig, offset: i64) -> Result<Vec<Update>> {
    let request = fetcher.get(&config.updates_url(offset), LONG_POLL_TIMEOUT);
    let response: UpdatesResponse = fetcher.send_json(request).await?;
    Ok(response.result)
}

/// Post text to the configured chat. Fire-and-forget.
pub fn send_message(fetcher: &Fetcher, config: &TelegramConfig, text: &str) {
    fetcher.post_form_detached(
        &config.send_url(),
        &[("chat_id", config.chat_id.trim()), ("text", text)],
        "telegram.sendMessage",
    );
}

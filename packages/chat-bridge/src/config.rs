//! Settings for every bridge, loaded from one JSON document.
//!
//! ```json
//! {
//!   "telegram": { "enabled": true, "token": "...", "chat-id": "-100123" },
//!   "discord": { "enabled": true, "webhook-url": "https://discord.com/api/webhooks/..." },
//!   "notifications": { "enabled": false },
//!   "skins": { "update-mode": "both" }
//! }
//! ```
//!
//! Missing sections and keys take their defaults. Credentials may also come
//! from the environment, which wins over the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::discord::DiscordConfig;
use crate::error::{BridgeError, Result};
use crate::live::NotificationConfig;
use crate::skin::SkinConfig;
use crate::telegram::TelegramConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub telegram: TelegramConfig,
    pub discord: DiscordConfig,
    pub notifications: NotificationConfig,
    pub skins: SkinConfig,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::Configuration(format!("invalid settings: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn apply_env(&mut self) {
        self.telegram.apply_env();
        self.discord.apply_env();
    }
}

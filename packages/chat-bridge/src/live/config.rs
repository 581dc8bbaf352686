//! Stream liveness notification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::scheduler::effective_interval;

pub const POLL_FLOOR_SECS: u64 = 15;

pub const WARMUP: Duration = Duration::from_secs(2);

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub poll_interval_seconds: u64,
    /// Placeholders: `{platform}`, `{name}`, `{url}`, `{title}`.
    pub message_format: String,
    pub twitch: PlatformConfig,
    pub youtube: PlatformConfig,
    pub tiktok: PlatformConfig,
    pub vklive: PlatformConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_seconds: 60,
            message_format: "&d[{platform}] &f{name} is live: &b{title} &7{url}".to_string(),
            twitch: PlatformConfig::default(),
            youtube: PlatformConfig::default(),
            tiktok: PlatformConfig::default(),
            vklive: PlatformConfig::default(),
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Err(BridgeError::Configuration("notifications disabled".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        effective_interval(POLL_FLOOR_SECS, self.poll_interval_seconds)
    }

    /// Platforms in polling order, with their display names.
    pub fn platforms(&self) -> [(&'static str, &PlatformConfig); 4] {
        [
            ("Twitch", &self.twitch),
            ("YouTube", &self.youtube),
            ("TikTok", &self.tiktok),
            ("VkLive", &self.vklive),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlatformConfig {
    pub enabled: bool,
    /// Default "currently live" pattern for this platform's pages.
    pub live_regex: String,
    /// Default title pattern; the first capture group is the title.
    pub title_regex: String,
    pub channels: Vec<ChannelTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChannelTarget {
    pub name: String,
    pub url: String,
    pub live_regex: Option<String>,
    pub title_regex: Option<String>,
}

impl ChannelTarget {
    pub fn live_regex<'a>(&'a self, platform: &'a PlatformConfig) -> &'a str {
        self.live_regex.as_deref().unwrap_or(&platform.live_regex)
    }

    pub fn title_regex<'a>(&'a self, platform: &'a PlatformConfig) -> &'a str {
        self.title_regex.as_deref().unwrap_or(&platform.title_regex)
    }
}

//! Skin bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::scheduler::effective_interval;

pub const UPDATE_FLOOR_SECS: u64 = 10;

/// Timeout for one skin lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Delay before a command-triggered refresh, so the command itself runs
/// first. One host tick.
pub const COMMAND_DELAY: Duration = Duration::from_millis(50);

const DEFAULT_TRIGGERS: [&str; 2] = ["/skin", "/sr"];

/// What keeps cached skins fresh after the join-time lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum UpdateMode {
    #[default]
    Interval,
    Command,
    Both,
}

impl From<String> for UpdateMode {
    /// Unknown values fall back to `interval`.
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "command" => UpdateMode::Command,
            "both" => UpdateMode::Both,
            _ => UpdateMode::Interval,
        }
    }
}

impl UpdateMode {
    pub fn uses_interval(self) -> bool {
        matches!(self, UpdateMode::Interval | UpdateMode::Both)
    }

    pub fn uses_command(self) -> bool {
        matches!(self, UpdateMode::Command | UpdateMode::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SkinConfig {
    pub enabled: bool,
    pub update_mode: UpdateMode,
    pub update_interval_seconds: u64,
    pub command_triggers: Vec<String>,
    /// Push fetched skins onto the players themselves.
    pub apply_to_players: bool,
    /// Serve cached skins for head icons.
    pub use_for_heads: bool,
    /// Skin lookup base URL; the external id is appended as the last segment.
    pub api_base: String,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_mode: UpdateMode::Interval,
            update_interval_seconds: 60,
            command_triggers: DEFAULT_TRIGGERS.iter().map(|t| t.to_string()).collect(),
            apply_to_players: true,
            use_for_heads: true,
            api_base: "https://api.geysermc.org/v2/skin".to_string(),
        }
    }
}

impl SkinConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Err(BridgeError::Configuration("skin bridge disabled".into()));
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        effective_interval(UPDATE_FLOOR_SECS, self.update_interval_seconds)
    }

    /// Triggers trimmed, lower-cased and `/`-prefixed. An empty list means
    /// the defaults.
    pub fn triggers(&self) -> Vec<String> {
        let normalized: Vec<String> = self
            .command_triggers
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| if t.starts_with('/') { t } else { format!("/{}", t) })
            .collect();

        if normalized.is_empty() {
            DEFAULT_TRIGGERS.iter().map(|t| t.to_string()).collect()
        } else {
            normalized
        }
    }

    /// Whether the first word of a command line is one of the triggers.
    pub fn matches_trigger(&self, command_line: &str) -> bool {
        let Some(root) = command_line.split_whitespace().next() else {
            return false;
        };
        let root = root.to_lowercase();
        self.triggers().iter().any(|t| *t == root)
    }

    pub fn lookup_url(&self, external_id: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(external_id.trim())
        )
    }
}

//! Normalized chat messages crossing the bridge boundary.

use serde::{Deserialize, Serialize};

use crate::player::PlayerRef;
use crate::template::{fill, TemplateResolver};

/// Whether an in-game message was sent to nearby players or to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Local,
    Global,
}

impl Scope {
    /// Short marker substituted for `{type}`.
    pub fn marker(self) -> &'static str {
        match self {
            Scope::Local => "L",
            Scope::Global => "G",
        }
    }
}

/// A message pulled from an external platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalMessage {
    pub author_label: String,
    pub text: String,
}

impl ExternalMessage {
    pub fn new(author_label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author_label: author_label.into(),
            text: text.into(),
        }
    }

    /// Render an inbound template (`{user}`, `{message}`).
    pub fn render(&self, template: &str) -> String {
        fill(
            template,
            &[("user", &self.author_label), ("message", &self.text)],
        )
    }
}

/// A message sent by a player in game, headed for external platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub player: PlayerRef,
    pub text: String,
    pub scope: Scope,
}

impl OutboundMessage {
    pub fn new(player: PlayerRef, text: impl Into<String>, scope: Scope) -> Self {
        Self {
            player,
            text: text.into(),
            scope,
        }
    }

    /// Render an outbound template: host placeholders first, then
    /// `{type}`, `{player}`, `{world}`, `{message}`.
    pub fn render(&self, resolver: &dyn TemplateResolver, template: &str) -> String {
        let resolved = resolver.resolve(&self.player, template);
        fill(
            &resolved,
            &[
                ("type", self.scope.marker()),
                ("player", &self.player.name),
                ("world", &self.player.world),
                ("message", &self.text),
            ],
        )
    }
}

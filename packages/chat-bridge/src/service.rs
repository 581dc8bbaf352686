//! The full set of bridges, started and stopped together.
//!
//! The host builds one [`BridgeSet`] from its [`Settings`], forwards player
//! events and outgoing chat into it, and swaps it wholesale when settings
//! change.

use std::sync::Arc;

use serde::Serialize;

use crate::capability::Capabilities;
use crate::config::Settings;
use crate::discord::DiscordBridge;
use crate::host::BridgeContext;
use crate::live::LiveNotifier;
use crate::message::OutboundMessage;
use crate::player::{PlayerDirectory, PlayerId, PlayerRef};
use crate::scheduler::BridgeState;
use crate::skin::{SkinBridge, SkinRecord};
use crate::telegram::TelegramBridge;

/// Point-in-time view of every bridge, for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeStats {
    pub telegram: BridgeState,
    pub discord: BridgeState,
    pub notifications: BridgeState,
    pub skins: BridgeState,
    pub telegram_cursor: i64,
    pub discord_cursor: Option<String>,
    pub cached_skins: usize,
    pub live_channels: usize,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl BridgeStats {
    /// Stats of a set with nothing running.
    pub fn idle() -> Self {
        Self {
            telegram: BridgeState::Stopped,
            discord: BridgeState::Stopped,
            notifications: BridgeState::Stopped,
            skins: BridgeState::Stopped,
            telegram_cursor: 0,
            discord_cursor: None,
            cached_skins: 0,
            live_channels: 0,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

pub struct BridgeSet {
    telegram: TelegramBridge,
    discord: DiscordBridge,
    live: LiveNotifier,
    skins: SkinBridge,
}

impl BridgeSet {
    pub fn start(
        settings: Settings,
        ctx: BridgeContext,
        caps: Capabilities,
        directory: Arc<dyn PlayerDirectory>,
    ) -> Self {
        Self {
            telegram: TelegramBridge::start(settings.telegram, ctx.clone()),
            discord: DiscordBridge::start(settings.discord, ctx.clone()),
            live: LiveNotifier::start(settings.notifications, ctx.clone()),
            skins: SkinBridge::start(settings.skins, ctx, caps, directory),
        }
    }

    /// Tear every bridge down and build it again from `settings`. No state
    /// carries over.
    pub fn reconfigure(self, settings: Settings) -> Self {
        tracing::info!("[Bridges] Reconfiguring");
        Self {
            telegram: self.telegram.reconfigure(settings.telegram),
            discord: self.discord.reconfigure(settings.discord),
            live: self.live.reconfigure(settings.notifications),
            skins: self.skins.reconfigure(settings.skins),
        }
    }

    /// Mirror a chat line from the game to both text bridges.
    pub fn send_from_game(&self, message: &OutboundMessage) {
        self.telegram.send_from_game(message);
        self.discord.send_from_game(message);
    }

    /// Call once the player is in the directory; skins are only cached for
    /// players it lists.
    pub fn on_player_join(&self, player: PlayerRef) {
        self.skins.on_join(player);
    }

    pub fn on_player_quit(&self, player: &PlayerId) {
        self.skins.on_quit(player);
    }

    /// Returns whether the command line triggered a skin refresh.
    pub fn on_player_command(&self, player: PlayerRef, command_line: &str) -> bool {
        self.skins.on_command(player, command_line)
    }

    pub fn head_texture(&self, player: &PlayerId) -> Option<SkinRecord> {
        self.skins.head_texture(player)
    }

    pub fn telegram(&self) -> &TelegramBridge {
        &self.telegram
    }

    pub fn discord(&self) -> &DiscordBridge {
        &self.discord
    }

    pub fn live(&self) -> &LiveNotifier {
        &self.live
    }

    pub fn skins(&self) -> &SkinBridge {
        &self.skins
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            telegram: self.telegram.state(),
            discord: self.discord.state(),
            notifications: self.live.state(),
            skins: self.skins.state(),
            telegram_cursor: self.telegram.cursor(),
            discord_cursor: self.discord.cursor(),
            cached_skins: self.skins.cache().len(),
            live_channels: self.live.live_count(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn stop(self) {
        self.telegram.stop();
        self.discord.stop();
        self.live.stop();
        self.skins.stop();
        tracing::info!("[Bridges] All bridges stopped");
    }
}

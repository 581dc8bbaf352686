//! Chat bridge
//!
//! Connects a game server's chat and player list to outside services:
//!
//! 1. **Telegram**: long-polls a bot for chat messages and posts game chat
//!    back with `sendMessage`.
//!
//! 2. **Discord**: polls a channel over REST and posts game chat through a
//!    webhook.
//!
//! 3. **Live notifications**: watches stream pages and announces a channel
//!    when it goes live.
//!
//! 4. **Skins**: looks up skins for players on the alternate client, caches
//!    them per player and applies them once per distinct skin.
//!
//! Bridges run as background tasks and never touch player-visible state
//! themselves. Everything they want shown or applied goes through a
//! [`host::HostHandle`] to the host's [`host::ApplyStage`], which runs on the
//! host's main thread.

pub mod cache;
pub mod capability;
pub mod config;
pub mod discord;
pub mod error;
pub mod host;
pub mod http;
pub mod live;
pub mod message;
pub mod player;
pub mod scheduler;
pub mod service;
pub mod skin;
pub mod status;
pub mod telegram;
pub mod template;

pub use capability::{Capabilities, CosmeticApplier, IdentityBridge};
pub use config::Settings;
pub use error::{BridgeError, ErrorKind, Result};
pub use host::{ApplyStage, BridgeContext, HostAction, HostHandle, PlayerSurface};
pub use message::{ExternalMessage, OutboundMessage, Scope};
pub use player::{OnlinePlayers, PlayerDirectory, PlayerId, PlayerRef};
pub use scheduler::BridgeState;
pub use service::{BridgeSet, BridgeStats};
pub use skin::{SkinCache, SkinRecord};
pub use template::TemplateResolver;

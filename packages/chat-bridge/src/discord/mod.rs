//! Discord chat bridge.
//!
//! Inbound: polls the last few channel messages over REST and deduplicates
//! them against the newest message id seen so far. Outbound: posts through a
//! channel webhook.

pub mod api;
pub mod config;

use std::sync::Arc;

pub use config::DiscordConfig;

use crate::cache::MessageIdCursor;
use crate::host::BridgeContext;
use crate::message::{ExternalMessage, OutboundMessage};
use crate::scheduler::{BridgeState, PollTask, TaskProbe, Tick};

use api::DiscordMessage;

pub struct DiscordBridge {
    config: Arc<DiscordConfig>,
    ctx: BridgeContext,
    cursor: Arc<MessageIdCursor>,
    task: Option<PollTask>,
}

impl DiscordBridge {
    pub fn start(config: DiscordConfig, ctx: BridgeContext) -> Self {
        let config = Arc::new(config);
        let cursor = Arc::new(MessageIdCursor::new());

        let task = match config.validate_inbound() {
            Ok(()) => {
                let (cfg, c, cur) = (config.clone(), ctx.clone(), cursor.clone());
                tracing::info!(
                    channel_id = config.channel_id.as_str(),
                    interval_secs = config.poll_interval().as_secs(),
                    "[Discord] Inbound polling started"
                );
                Some(PollTask::spawn(
                    "discord",
                    config::WARMUP,
                    config.poll_interval(),
                    move |tick| poll_once(cfg.clone(), c.clone(), cur.clone(), tick),
                ))
            }
            Err(e) => {
                tracing::info!(reason = %e, "[Discord] Inbound polling not started");
                None
            }
        };
        if config.outbound_enabled() {
            tracing::info!("[Discord] Outbound webhook enabled");
        }

        Self {
            config,
            ctx,
            cursor,
            task,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task.is_some()
    }

    pub fn state(&self) -> BridgeState {
        self.task.as_ref().map_or(BridgeState::Stopped, |t| t.state())
    }

    pub fn probe(&self) -> Option<TaskProbe> {
        self.task.as_ref().map(|t| t.probe())
    }

    pub fn cursor(&self) -> Option<String> {
        self.cursor.get()
    }

    pub fn send_from_game(&self, message: &OutboundMessage) {
        if !self.config.outbound_enabled() {
            return;
        }
        let text = message.render(self.ctx.resolver.as_ref(), &self.config.format_to_discord);
        api::send_webhook(&self.ctx.fetcher, &self.config, &text);
    }

    pub fn reconfigure(self, config: DiscordConfig) -> Self {
        let ctx = self.ctx.clone();
        self.stop();
        Self::start(config, ctx)
    }

    pub fn stop(self) {
        if let Some(task) = self.task {
            task.stop();
            tracing::info!("[Discord] Inbound polling stopped");
        }
    }
}

async fn poll_once(
    config: Arc<DiscordConfig>,
    ctx: BridgeContext,
    cursor: Arc<MessageIdCursor>,
    tick: Tick,
) {
    let messages = match api::fetch_recent(&ctx.fetcher, &config).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::debug!(tick = tick.number, error = %e, "[Discord] Poll failed");
            return;
        }
    };

    tick.applying();
    for message in accept_messages(&cursor, messages) {
        ctx.host.present(message.render(&config.format_from_discord));
    }
}

/// Take a newest-first batch and return the unseen human messages, oldest
/// first. The cursor moves to each accepted message's id.
pub fn accept_messages(cursor: &MessageIdCursor, newest_first: Vec<DiscordMessage>) -> Vec<ExternalMessage> {
    let mut accepted = Vec::new();

    for message in newest_first.into_iter().rev() {
        let (Some(author), Some(content)) = (message.author, message.content) else {
            continue;
        };
        if author.is_bot() {
            continue;
        }
        if !cursor.advance(&message.id) {
            continue;
        }
        if content.trim().is_empty() {
            // Attachment-only messages have nothing to show.
            continue;
        }
        accepted.push(ExternalMessage::new(author.username, content));
    }

    accepted
}

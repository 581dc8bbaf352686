//! Telegram chat bridge.
//!
//! Inbound messages come from the Bot API long poll (`getUpdates`) using a
//! monotonically increasing update cursor; outbound messages are posted with
//! `sendMessage`. Each started bridge owns a fresh cursor, so a restart
//! begins from whatever the server still holds.

pub mod api;
pub mod config;

use std::sync::Arc;

pub use config::TelegramConfig;

use crate::cache::SequenceCursor;
use crate::host::BridgeContext;
use crate::message::{ExternalMessage, OutboundMessage};
use crate::scheduler::{BridgeState, PollTask, TaskProbe, Tick};

use api::{Update, User};

pub struct TelegramBridge {
    config: Arc<TelegramConfig>,
    ctx: BridgeContext,
    cursor: Arc<SequenceCursor>,
    task: Option<PollTask>,
}

impl TelegramBridge {
    /// Start polling. A disabled or incomplete config yields a stopped bridge.
    pub fn start(config: TelegramConfig, ctx: BridgeContext) -> Self {
        let config = Arc::new(config);
        let cursor = Arc::new(SequenceCursor::new());

        let task = match config.validate() {
            Ok(()) => {
                let (cfg, c, cur) = (config.clone(), ctx.clone(), cursor.clone());
                tracing::info!(
                    chat_id = config.chat_id.as_str(),
                    interval_secs = config.poll_interval().as_secs(),
                    "[Telegram] Bridge started"
                );
                Some(PollTask::spawn(
                    "telegram",
                    config::WARMUP,
                    config.poll_interval(),
                    move |tick| poll_once(cfg.clone(), c.clone(), cur.clone(), tick),
                ))
            }
            Err(e) => {
                tracing::info!(reason = %e, "[Telegram] Bridge not started");
                None
            }
        };

        Self {
            config,
            ctx,
            cursor,
            task,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn state(&self) -> BridgeState {
        self.task.as_ref().map_or(BridgeState::Stopped, |t| t.state())
    }

    pub fn probe(&self) -> Option<TaskProbe> {
        self.task.as_ref().map(|t| t.probe())
    }

    pub fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Forward an in-game message to the chat.
    pub fn send_from_game(&self, message: &OutboundMessage) {
        if !self.is_running() {
            return;
        }
        let text = message.render(self.ctx.resolver.as_ref(), &self.config.format_to_telegram);
        api::send_message(&self.ctx.fetcher, &self.config, &text);
    }

    /// Stop, then start again from `config` with a fresh cursor.
    pub fn reconfigure(self, config: TelegramConfig) -> Self {
        let ctx = self.ctx.clone();
        self.stop();
        Self::start(config, ctx)
    }

    pub fn stop(self) {
        if let Some(task) = self.task {
            task.stop();
            tracing::info!("[Telegram] Bridge stopped");
        }
    }
}

async fn poll_once(
    config: Arc<TelegramConfig>,
    ctx: BridgeContext,
    cursor: Arc<SequenceCursor>,
    tick: Tick,
) {
    let offset = cursor.get() + 1;
    let updates = match api::fetch_updates(&ctx.fetcher, &config, offset).await {
        Ok(updates) => updates,
        Err(e) => {
            tracing::debug!(tick = tick.number, offset, error = %e, "[Telegram] Poll failed");
            return;
        }
    };
    if updates.is_empty() {
        return;
    }

    tick.applying();
    for message in accept_updates(&cursor, &config.chat_id, updates) {
        ctx.host.present(message.render(&config.format_from_telegram));
    }
}

/// Walk updates in arrival order, advancing the cursor past every one, and
/// keep the human text messages from the configured chat.
///
/// An update at or behind the cursor has been handled already and is
/// dropped.
pub fn accept_updates(cursor: &SequenceCursor, chat_id: &str, updates: Vec<Update>) -> Vec<ExternalMessage> {
    let chat_id = chat_id.trim();
    let mut accepted = Vec::new();

    for update in updates {
        if !cursor.advance(update.update_id) {
            continue;
        }
        let Some(message) = update.message else {
            continue;
        };
        let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        if message.chat.as_ref().map(|c| c.id.to_string()).as_deref() != Some(chat_id) {
            continue;
        }
        if message.from.as_ref().is_some_and(|f| f.is_bot) {
            continue;
        }

        accepted.push(ExternalMessage::new(User::label(message.from.as_ref()), text));
    }

    accepted
}

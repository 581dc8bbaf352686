//! Hand-off from background bridges to the host's main thread.
//!
//! Bridges never touch player-visible state. They push a [`HostAction`]
//! through a [`HostHandle`]; the host owns the matching [`ApplyStage`] and
//! drains it from its single update thread, where every broadcast and
//! appearance change happens.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::capability::{Capabilities, CosmeticApplier};
use crate::error::Result;
use crate::http::Fetcher;
use crate::player::PlayerRef;
use crate::skin::SkinRecord;
use crate::template::{PassthroughResolver, TemplateResolver};

/// Work that must run on the host's main thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// Show rendered text to every connected viewer and the console.
    Present(String),
    /// Change a player's visible textures.
    ApplySkin { player: PlayerRef, record: SkinRecord },
}

/// Sender side, cloned into every bridge.
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostAction>,
}

impl HostHandle {
    pub fn present(&self, text: impl Into<String>) {
        self.send(HostAction::Present(text.into()));
    }

    pub fn apply_skin(&self, player: PlayerRef, record: SkinRecord) {
        self.send(HostAction::ApplySkin { player, record });
    }

    fn send(&self, action: HostAction) {
        if self.tx.send(action).is_err() {
            tracing::debug!("[Host] Apply stage closed, dropping action");
        }
    }
}

/// What every bridge is built with: the shared HTTP client, the way back to
/// the main thread, and the host's placeholder resolver.
#[derive(Clone)]
pub struct BridgeContext {
    pub fetcher: Fetcher,
    pub host: HostHandle,
    pub resolver: Arc<dyn TemplateResolver>,
}

impl BridgeContext {
    pub fn new(host: HostHandle) -> Self {
        Self {
            fetcher: Fetcher::new(),
            host,
            resolver: Arc::new(PassthroughResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TemplateResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Player-visible surface, implemented by the host on its main thread.
pub trait PlayerSurface {
    /// Broadcast to all viewers and the console sink.
    fn present(&mut self, text: &str);

    /// Assign texture properties directly on the player's profile.
    fn set_textures(&mut self, player: &PlayerRef, record: &SkinRecord) -> Result<()>;
}

/// Receiver side, owned by the host's main thread.
pub struct ApplyStage {
    rx: mpsc::UnboundedReceiver<HostAction>,
    applier: Arc<dyn CosmeticApplier>,
}

/// Create a connected handle / apply-stage pair. The stage applies skins
/// through the same companion the bridges were bound with.
pub fn channel(caps: &Capabilities) -> (HostHandle, ApplyStage) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        HostHandle { tx },
        ApplyStage {
            rx,
            applier: caps.applier.clone(),
        },
    )
}

impl ApplyStage {
    /// Apply everything queued so far without waiting. Returns the number of
    /// actions applied. Meant to be called once per host tick.
    pub fn drain(&mut self, surface: &mut dyn PlayerSurface) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.apply(action, surface);
            applied += 1;
        }
        applied
    }

    /// Wait for the next queued action. `None` once every handle is gone.
    pub async fn recv(&mut self) -> Option<HostAction> {
        self.rx.recv().await
    }

    pub fn apply(&self, action: HostAction, surface: &mut dyn PlayerSurface) {
        match action {
            HostAction::Present(text) => surface.present(&text),
            HostAction::ApplySkin { player, record } => {
                self.apply_skin(&player, &record, surface)
            }
        }
    }

    /// Companion service first, then direct assignment. When the companion
    /// is present but reports failure, direct assignment gets a second try.
    fn apply_skin(&self, player: &PlayerRef, record: &SkinRecord, surface: &mut dyn PlayerSurface) {
        if record.is_blank() {
            return;
        }

        let companion = self.applier.is_available();
        let applied = companion && self.applier.apply(player, record);
        let attempts = if companion && !applied { 2 } else { 1 };

        for attempt in 1..=attempts {
            match surface.set_textures(player, record) {
                Ok(()) => return,
                Err(e) => tracing::debug!(
                    player = %player.id,
                    attempt,
                    error = %e,
                    "[Host] Direct texture assignment failed"
                ),
            }
        }
    }
}

//! Optional companion services, bound at startup.
//!
//! The host probes for each companion it knows about and hands over an
//! adapter when one is present. Anything missing is replaced by a no-op
//! adapter, so bridge code never branches on presence itself.

use std::sync::Arc;

use crate::player::{PlayerId, PlayerRef};
use crate::skin::SkinRecord;

/// Companion service bridging players from the alternate client population.
pub trait IdentityBridge: Send + Sync {
    /// Whether the player connected through the alternate client.
    fn is_alternate_client(&self, player: &PlayerId) -> bool;

    /// A cosmetic record the service already resolved, if any.
    fn direct_skin(&self, player: &PlayerId) -> Option<SkinRecord>;

    /// Secondary external identity used to look skins up remotely.
    fn external_id(&self, player: &PlayerId) -> Option<String>;
}

/// Companion service that changes a player's visible appearance.
pub trait CosmeticApplier: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Returns `false` when the change was not applied.
    fn apply(&self, player: &PlayerRef, record: &SkinRecord) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoIdentityBridge;

impl IdentityBridge for NoIdentityBridge {
    fn is_alternate_client(&self, _player: &PlayerId) -> bool {
        false
    }

    fn direct_skin(&self, _player: &PlayerId) -> Option<SkinRecord> {
        None
    }

    fn external_id(&self, _player: &PlayerId) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCosmeticApplier;

impl CosmeticApplier for NoCosmeticApplier {
    fn is_available(&self) -> bool {
        false
    }

    fn apply(&self, _player: &PlayerRef, _record: &SkinRecord) -> bool {
        false
    }
}

/// The set of companion adapters the host bound at startup.
#[derive(Clone)]
pub struct Capabilities {
    pub identity: Arc<dyn IdentityBridge>,
    pub applier: Arc<dyn CosmeticApplier>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::none()
    }
}

impl Capabilities {
    pub fn none() -> Self {
        Self {
            identity: Arc::new(NoIdentityBridge),
            applier: Arc::new(NoCosmeticApplier),
        }
    }

    /// Bind whichever adapters the host found, falling back to no-ops.
    pub fn detect(
        identity: Option<Arc<dyn IdentityBridge>>,
        applier: Option<Arc<dyn CosmeticApplier>>,
    ) -> Self {
        let applier = applier.filter(|a| a.is_available());
        tracing::info!(
            identity_bridge = identity.is_some(),
            cosmetic_applier = applier.is_some(),
            "[Capabilities] Companion services bound"
        );
        Self {
            identity: identity.unwrap_or_else(|| Arc::new(NoIdentityBridge)),
            applier: applier.unwrap_or_else(|| Arc::new(NoCosmeticApplier)),
        }
    }
}

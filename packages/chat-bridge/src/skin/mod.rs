//! Skin bridge for players joining through the alternate client.
//!
//! Resolves each such player's skin from the identity companion (directly,
//! or through a lookup by external id), keeps one record per player in a
//! [`SkinCache`] and hands changed skins to the host's apply stage. Refreshes
//! run on join, on a chat-command trigger and on a periodic sweep.

pub mod api;
pub mod config;
pub mod store;

use std::sync::Arc;

use futures::future::join_all;

pub use config::{SkinConfig, UpdateMode};
pub use store::{SkinCache, SkinRecord};

use crate::capability::Capabilities;
use crate::host::BridgeContext;
use crate::player::{PlayerDirectory, PlayerId, PlayerRef};
use crate::scheduler::{BridgeState, PollTask, TaskProbe};

/// Shared by the bridge handle and every refresh it spawns.
#[derive(Clone)]
struct SkinWorker {
    config: Arc<SkinConfig>,
    ctx: BridgeContext,
    caps: Capabilities,
    cache: SkinCache,
    directory: Arc<dyn PlayerDirectory>,
}

impl SkinWorker {
    fn is_alternate(&self, player: &PlayerId) -> bool {
        self.caps.identity.is_alternate_client(player)
    }

    /// Direct record from the identity companion first, then a lookup by
    /// external id.
    async fn refresh_player(self, player: PlayerRef) {
        if let Some(direct) = self.caps.identity.direct_skin(&player.id).filter(|r| !r.is_blank()) {
            self.apply_and_cache(player, direct);
            return;
        }

        let Some(external_id) = self
            .caps
            .identity
            .external_id(&player.id)
            .filter(|id| !id.trim().is_empty())
        else {
            return;
        };

        match api::fetch_skin(&self.ctx.fetcher, &self.config, &external_id).await {
            Ok(Some(record)) => {
                self.apply_and_cache(player, record);
            }
            Ok(None) => tracing::debug!(player = %player.id, "[Skin] Lookup returned no skin"),
            Err(e) => tracing::debug!(player = %player.id, error = %e, "[Skin] Lookup failed"),
        }
    }

    /// Cache the record if it differs from what is held, and queue it for
    /// application. Returns whether anything changed. Players who left while
    /// their lookup was in flight are skipped.
    fn apply_and_cache(&self, player: PlayerRef, record: SkinRecord) -> bool {
        if !self.directory.is_online(&player.id) {
            tracing::debug!(player = %player.id, "[Skin] Player left before refresh finished");
            return false;
        }
        if !self.cache.offer(player.id, record.clone()) {
            return false;
        }
        tracing::debug!(
            player = %player.id,
            name = player.name.as_str(),
            hash = record.hash.as_deref().unwrap_or("-"),
            "[Skin] Cached new skin"
        );
        if self.config.apply_to_players {
            self.ctx.host.apply_skin(player, record);
        }
        true
    }

    async fn sweep(self, players: Vec<PlayerRef>) {
        let refreshes = players
            .into_iter()
            .filter(|p| self.is_alternate(&p.id))
            .map(|p| self.clone().refresh_player(p));
        join_all(refreshes).await;
    }
}

pub struct SkinBridge {
    worker: SkinWorker,
    task: Option<PollTask>,
}

impl SkinBridge {
    pub fn start(
        config: SkinConfig,
        ctx: BridgeContext,
        caps: Capabilities,
        directory: Arc<dyn PlayerDirectory>,
    ) -> Self {
        let worker = SkinWorker {
            config: Arc::new(config),
            ctx,
            caps,
            cache: SkinCache::new(),
            directory,
        };

        if let Err(e) = worker.config.validate() {
            tracing::info!(reason = %e, "[Skin] Bridge not started");
            return Self { worker, task: None };
        }

        if worker.config.apply_to_players && worker.caps.applier.is_available() {
            tokio::spawn(worker.clone().sweep(worker.directory.online_players()));
        }

        let task = worker.config.update_mode.uses_interval().then(|| {
            let interval = worker.config.update_interval();
            let w = worker.clone();
            PollTask::spawn("skin", interval, interval, move |_tick| {
                w.clone().sweep(w.directory.online_players())
            })
        });

        tracing::info!(
            mode = ?worker.config.update_mode,
            apply_to_players = worker.config.apply_to_players,
            "[Skin] Bridge started"
        );
        Self { worker, task }
    }

    pub fn is_enabled(&self) -> bool {
        self.worker.config.enabled
    }

    pub fn state(&self) -> BridgeState {
        self.task.as_ref().map_or(BridgeState::Stopped, |t| t.state())
    }

    pub fn probe(&self) -> Option<TaskProbe> {
        self.task.as_ref().map(|t| t.probe())
    }

    pub fn cache(&self) -> &SkinCache {
        &self.worker.cache
    }

    /// Cached skin to draw a player's head with, if heads use bridged skins.
    pub fn head_texture(&self, player: &PlayerId) -> Option<SkinRecord> {
        if !self.is_enabled() || !self.worker.config.use_for_heads {
            return None;
        }
        self.worker.cache.get(player)
    }

    pub fn on_join(&self, player: PlayerRef) {
        if !self.is_enabled() || !self.worker.is_alternate(&player.id) {
            return;
        }
        tokio::spawn(self.worker.clone().refresh_player(player));
    }

    pub fn on_quit(&self, player: &PlayerId) {
        self.worker.cache.remove(player);
    }

    /// Schedule a refresh when `command_line` starts with a trigger.
    /// Returns whether one was scheduled.
    pub fn on_command(&self, player: PlayerRef, command_line: &str) -> bool {
        let settings = &self.worker.config;
        if !self.is_enabled() || !settings.update_mode.uses_command() {
            return false;
        }
        if !self.worker.is_alternate(&player.id) || !settings.matches_trigger(command_line) {
            return false;
        }

        let worker = self.worker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(config::COMMAND_DELAY).await;
            worker.refresh_player(player).await;
        });
        true
    }

    /// Stop, then start again from `config` with an empty cache.
    pub fn reconfigure(self, config: SkinConfig) -> Self {
        let ctx = self.worker.ctx.clone();
        let caps = self.worker.caps.clone();
        let directory = self.worker.directory.clone();
        self.stop();
        Self::start(config, ctx, caps, directory)
    }

    pub fn stop(self) {
        if let Some(task) = self.task {
            task.stop();
        }
        tracing::info!("[Skin] Bridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::capability::{CosmeticApplier, IdentityBridge};
    use crate::host::{self, ApplyStage, HostAction};
    use crate::player::OnlinePlayers;
    use dashmap::DashMap;

    /// Identity companion backed by a map of direct skins. Every player it
    /// knows is an alternate-client player.
    #[derive(Default)]
    struct FakeIdentity {
        skins: DashMap<PlayerId, SkinRecord>,
    }

    impl IdentityBridge for FakeIdentity {
        fn is_alternate_client(&self, player: &PlayerId) -> bool {
            self.skins.contains_key(player)
        }

        fn direct_skin(&self, player: &PlayerId) -> Option<SkinRecord> {
            self.skins.get(player).map(|r| r.clone())
        }

        fn external_id(&self, _player: &PlayerId) -> Option<String> {
            None
        }
    }

    struct Applier;

    impl CosmeticApplier for Applier {
        fn apply(&self, _player: &PlayerRef, _record: &SkinRecord) -> bool {
            true
        }
    }

    fn player(name: &str) -> PlayerRef {
        PlayerRef::new(uuid::Uuid::new_v4(), name, "world")
    }

    fn online_with(players: &[&PlayerRef]) -> OnlinePlayers {
        let online = OnlinePlayers::new();
        for player in players {
            online.join((*player).clone());
        }
        online
    }

    fn command_only() -> SkinConfig {
        SkinConfig {
            update_mode: UpdateMode::Command,
            ..Default::default()
        }
    }

    fn start(config: SkinConfig, identity: Arc<FakeIdentity>, online: &OnlinePlayers) -> (SkinBridge, ApplyStage) {
        let caps = Capabilities {
            identity,
            ..Capabilities::none()
        };
        let (handle, stage) = host::channel(&caps);
        let bridge = SkinBridge::start(config, BridgeContext::new(handle), caps, Arc::new(online.clone()));
        (bridge, stage)
    }

    async fn next_action(stage: &mut ApplyStage) -> Option<HostAction> {
        tokio::time::timeout(Duration::from_millis(200), stage.recv()).await.ok().flatten()
    }

    #[tokio::test]
    async fn test_join_applies_once_per_distinct_skin() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        let record = SkinRecord::new("A", Some("S".to_string())).with_hash("H1");
        identity.skins.insert(steve.id, record.clone());

        let (bridge, mut stage) = start(command_only(), identity.clone(), &online_with(&[&steve]));

        bridge.on_join(steve.clone());
        assert_eq!(
            next_action(&mut stage).await,
            Some(HostAction::ApplySkin { player: steve.clone(), record: record.clone() })
        );

        bridge.on_join(steve.clone());
        assert_eq!(next_action(&mut stage).await, None);

        let changed = record.clone().with_hash("H2");
        identity.skins.insert(steve.id, changed.clone());
        bridge.on_join(steve.clone());
        assert_eq!(
            next_action(&mut stage).await,
            Some(HostAction::ApplySkin { player: steve.clone(), record: changed })
        );
        assert_eq!(bridge.head_texture(&steve.id).unwrap().hash.as_deref(), Some("H2"));
    }

    #[tokio::test]
    async fn test_regular_players_are_ignored() {
        let (bridge, mut stage) = start(command_only(), Arc::new(FakeIdentity::default()), &OnlinePlayers::new());
        let alex = player("Alex");
        bridge.on_join(alex.clone());
        assert!(!bridge.on_command(alex, "/skin"));
        assert_eq!(next_action(&mut stage).await, None);
        assert!(bridge.cache().is_empty());
    }

    #[tokio::test]
    async fn test_quit_clears_cache() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let (bridge, mut stage) = start(command_only(), identity, &online_with(&[&steve]));

        bridge.on_join(steve.clone());
        assert!(next_action(&mut stage).await.is_some());
        assert_eq!(bridge.cache().len(), 1);

        bridge.on_quit(&steve.id);
        assert!(bridge.head_texture(&steve.id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_trigger_refreshes_after_delay() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let (bridge, _stage) = start(command_only(), identity, &online_with(&[&steve]));

        assert!(!bridge.on_command(steve.clone(), "/spawn"));
        assert!(bridge.on_command(steve.clone(), "/SKIN set Notch"));
        tokio::task::yield_now().await;
        assert!(bridge.cache().is_empty());

        tokio::time::sleep(config::COMMAND_DELAY * 2).await;
        assert_eq!(bridge.cache().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_finishing_after_quit_is_dropped() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let online = online_with(&[&steve]);
        let (bridge, mut stage) = start(command_only(), identity, &online);

        // The refresh is still waiting out its delay when the player leaves.
        assert!(bridge.on_command(steve.clone(), "/skin"));
        online.quit(&steve.id);
        bridge.on_quit(&steve.id);

        tokio::time::sleep(config::COMMAND_DELAY * 2).await;
        assert!(bridge.cache().is_empty());
        assert_eq!(next_action(&mut stage).await, None);
    }

    #[tokio::test]
    async fn test_join_without_directory_entry_caches_nothing() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let (bridge, mut stage) = start(command_only(), identity, &OnlinePlayers::new());

        bridge.on_join(steve.clone());
        assert_eq!(next_action(&mut stage).await, None);
        assert!(bridge.head_texture(&steve.id).is_none());
    }

    #[tokio::test]
    async fn test_command_ignored_in_interval_mode() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let (bridge, _stage) = start(SkinConfig::default(), identity, &OnlinePlayers::new());

        assert!(!bridge.on_command(steve, "/skin"));
        bridge.stop();
    }

    #[tokio::test]
    async fn test_start_sweeps_online_players_when_applier_present() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let online = OnlinePlayers::new();
        online.join(steve.clone());
        online.join(player("Alex"));

        let caps = Capabilities {
            identity,
            applier: Arc::new(Applier),
        };
        let (handle, mut stage) = host::channel(&caps);
        let bridge = SkinBridge::start(command_only(), BridgeContext::new(handle), caps, Arc::new(online));

        match next_action(&mut stage).await {
            Some(HostAction::ApplySkin { player, .. }) => assert_eq!(player, steve),
            other => panic!("expected skin application, got {:?}", other),
        }
        assert_eq!(next_action(&mut stage).await, None);
        assert_eq!(bridge.cache().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_sweep() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let online = OnlinePlayers::new();
        online.join(steve.clone());

        let config = SkinConfig {
            update_interval_seconds: 30,
            ..Default::default()
        };
        let (bridge, _stage) = start(config, identity, &online);
        assert_eq!(bridge.state(), BridgeState::Scheduled);

        // No applier bound, so nothing happens until the first interval.
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(bridge.cache().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(bridge.cache().len(), 1);

        bridge.stop();
    }

    #[tokio::test]
    async fn test_disabled_bridge_is_inert() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let config = SkinConfig {
            enabled: false,
            ..Default::default()
        };
        let (bridge, mut stage) = start(config, identity, &OnlinePlayers::new());

        bridge.on_join(steve.clone());
        assert_eq!(next_action(&mut stage).await, None);
        assert!(bridge.head_texture(&steve.id).is_none());
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_heads_can_be_turned_off() {
        let identity = Arc::new(FakeIdentity::default());
        let steve = player("Steve");
        identity.skins.insert(steve.id, SkinRecord::new("A", None));
        let config = SkinConfig {
            use_for_heads: false,
            apply_to_players: false,
            ..command_only()
        };
        let (bridge, mut stage) = start(config, identity, &online_with(&[&steve]));

        bridge.on_join(steve.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(bridge.cache().len(), 1);
        assert!(bridge.head_texture(&steve.id).is_none());
        // Not applied to the player either.
        assert_eq!(next_action(&mut stage).await, None);
    }
}

//! Player identity as seen by the bridges.
//!
//! The bridges never hold live player objects; they work with a small
//! snapshot and ask the host for the current online set when sweeping.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

pub type PlayerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
    pub world: String,
}

impl PlayerRef {
    pub fn new(id: PlayerId, name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            world: world.into(),
        }
    }
}

/// Host collaborator listing currently connected players.
pub trait PlayerDirectory: Send + Sync {
    fn online_players(&self) -> Vec<PlayerRef>;

    fn is_online(&self, id: &PlayerId) -> bool {
        self.online_players().iter().any(|p| p.id == *id)
    }
}

/// Directory the host keeps current from its join/quit events.
#[derive(Clone, Default)]
pub struct OnlinePlayers {
    players: Arc<DashMap<PlayerId, PlayerRef>>,
}

impl OnlinePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, player: PlayerRef) {
        self.players.insert(player.id, player);
    }

    pub fn quit(&self, id: &PlayerId) -> Option<PlayerRef> {
        self.players.remove(id).map(|(_, p)| p)
    }

    pub fn get(&self, id: &PlayerId) -> Option<PlayerRef> {
        self.players.get(id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PlayerDirectory for OnlinePlayers {
    fn online_players(&self) -> Vec<PlayerRef> {
        self.players.iter().map(|r| r.value().clone()).collect()
    }

    fn is_online(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_players() {
        let online = OnlinePlayers::new();
        let steve = PlayerRef::new(Uuid::new_v4(), "Steve", "world");
        let alex = PlayerRef::new(Uuid::new_v4(), "Alex", "world_nether");

        online.join(steve.clone());
        online.join(alex.clone());
        assert_eq!(online.len(), 2);
        assert_eq!(online.get(&alex.id), Some(alex.clone()));

        assert!(online.is_online(&steve.id));
        assert_eq!(online.quit(&steve.id), Some(steve.clone()));
        assert!(!online.is_online(&steve.id));
        assert_eq!(online.online_players(), vec![alex]);
    }
}

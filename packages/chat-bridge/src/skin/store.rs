//! In-memory skin record cache.
//!
//! One record per connected player, fully replaced on change and removed
//! when the player disconnects. Written by the skin bridge's background
//! work, read by the host when it renders head icons.

use std::sync::Arc;

use base64::Engine;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

// ── Skin Record ──────────────────────────────────────────────────────────────

/// Opaque texture payload plus an optional content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinRecord {
    pub value: String,
    pub signature: Option<String>,
    pub hash: Option<String>,
    pub texture_id: Option<String>,
}

impl SkinRecord {
    pub fn new(value: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            value: value.into(),
            signature,
            hash: None,
            texture_id: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_texture_id(mut self, texture_id: impl Into<String>) -> Self {
        self.texture_id = Some(texture_id.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn content_hash(&self) -> Option<&str> {
        self.hash.as_deref().filter(|h| !h.trim().is_empty())
    }

    /// Whether replacing `self` with `other` would be a no-op.
    ///
    /// Equal only when both hashes are present and equal, or both are absent
    /// and value and signature match. A hash on one side only, or differing
    /// hashes, always count as a change.
    pub fn same_content(&self, other: &SkinRecord) -> bool {
        match (self.content_hash(), other.content_hash()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => {
                self.value == other.value
                    && self.signature.as_deref().unwrap_or("")
                        == other.signature.as_deref().unwrap_or("")
            }
            _ => false,
        }
    }

    /// Skin image URL embedded in the base64 texture payload, if any.
    pub fn texture_url(&self) -> Option<String> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(self.value.trim())
            .ok()?;
        let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
        json.pointer("/textures/SKIN/url")
            .and_then(|u| u.as_str())
            .map(str::to_string)
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SkinCache {
    records: Arc<DashMap<PlayerId, SkinRecord>>,
}

impl SkinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` unless it matches what is cached already.
    ///
    /// Returns `true` when the cache changed and the new texture should be
    /// applied to the player.
    pub fn offer(&self, player: PlayerId, record: SkinRecord) -> bool {
        match self.records.entry(player) {
            Entry::Occupied(mut entry) => {
                if entry.get().same_content(&record) {
                    return false;
                }
                entry.insert(record);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    pub fn get(&self, player: &PlayerId) -> Option<SkinRecord> {
        self.records.get(player).map(|r| r.clone())
    }

    pub fn remove(&self, player: &PlayerId) -> Option<SkinRecord> {
        self.records.remove(player).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

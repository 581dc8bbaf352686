//! Thread-safe dedup state shared between a bridge's poller and its readers.
//!
//! Each structure has a single writer (the owning bridge) and any number of
//! readers, so an atomic or a concurrent map is enough. None of it outlives
//! the process; a restarted bridge starts from fresh state.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use dashmap::DashMap;

// ── Sequence Cursor ──────────────────────────────────────────────────────────

/// Monotonic numeric cursor (last-seen update sequence).
#[derive(Debug, Default)]
pub struct SequenceCursor {
    value: AtomicI64,
}

impl SequenceCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i64 {
        self.value.load(AtomicOrdering::SeqCst)
    }

    /// Move the cursor to `max(current, key)`.
    ///
    /// Returns `true` when `key` was strictly ahead of the cursor, i.e. the
    /// item has not been seen before.
    pub fn advance(&self, key: i64) -> bool {
        self.value.fetch_max(key, AtomicOrdering::SeqCst) < key
    }
}

// ── Message Id Cursor ────────────────────────────────────────────────────────

/// Order two time-ordered message ids.
///
/// Ids are decimal snowflakes, so a shorter id is always older; ids of equal
/// length compare lexicographically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Monotonic cursor over ordered string ids (last-seen message id).
#[derive(Debug, Default)]
pub struct MessageIdCursor {
    last: Mutex<Option<String>>,
}

impl MessageIdCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Accept `id` if it orders strictly after the cursor, moving the cursor
    /// to it. Ids at or behind the cursor are rejected and leave it as is.
    pub fn advance(&self, id: &str) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match last.as_deref() {
            Some(current) if compare_ids(id, current) != Ordering::Greater => false,
            _ => {
                *last = Some(id.to_string());
                true
            }
        }
    }
}

// ── Live States ──────────────────────────────────────────────────────────────

/// Per-channel "currently live" flags, keyed `platform:name`.
#[derive(Debug, Default)]
pub struct LiveStates {
    states: DashMap<String, bool>,
}

impl LiveStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(platform: &str, name: &str) -> String {
        format!("{}:{}", platform, name)
    }

    /// Store the fresh observation and report whether it is a false→true
    /// edge. Unknown channels count as not live.
    pub fn observe(&self, key: &str, live: bool) -> bool {
        let was_live = self.states.insert(key.to_string(), live).unwrap_or(false);
        !was_live && live
    }

    pub fn is_live(&self, key: &str) -> bool {
        self.states.get(key).map(|r| *r.value()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.states.iter().filter(|r| *r.value()).count()
    }
}

//! Operator "seen" markers keyed by multiplexer target.
//!
//! A marker means the operator has focused that target since its last
//! transition to `Unread`. The set is persisted by the runtime so a restart
//! does not reset every session to unread.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SEEN_MARKERS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenMarkers {
    #[serde(default)]
    pub last_seen: BTreeMap<String, DateTime<Utc>>,
    #[serde(default = "current_version")]
    pub version: u32,
    /// Set whenever a marker is added, refreshed or cleared.
    #[serde(skip)]
    dirty: bool,
}

fn current_version() -> u32 {
    SEEN_MARKERS_VERSION
}

impl Default for SeenMarkers {
    fn default() -> Self {
        Self {
            last_seen: BTreeMap::new(),
            version: SEEN_MARKERS_VERSION,
            dirty: false,
        }
    }
}

impl SeenMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seen(&self, target: &str) -> bool {
        self.last_seen.contains_key(target)
    }

    /// Record or refresh a marker.
    pub fn mark_seen(&mut self, target: &str, now: DateTime<Utc>) {
        if self.last_seen.insert(target.to_string(), now) != Some(now) {
            self.dirty = true;
        }
    }

    pub fn clear(&mut self, target: &str) {
        if self.last_seen.remove(target).is_some() {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and reset the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

// Copyright 2026 stattab Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use stattab_common::hasher::hash_str;
use stattab_memory::entity::{Entity, EntityKey, EntityKind};

/// A plain value tally, keyed by the value string itself.
///
/// Covers the tables that count occurrences of one string: referrers, user
/// agents, search strings, and authenticated user names. Each gets its own
/// cache instance; the counter shape is identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tally {
    /// The counted value (referrer URL, user agent string, etc.), or the
    /// group name for group aggregates.
    pub value: String,

    /// Occurrence count.
    pub hits: u64,
    /// Visits started.
    pub visits: u64,
    /// Transfer amount in bytes.
    pub xfer_bytes: u64,

    kind: EntityKind,
    dirty: bool,
}

impl Tally {
    /// A regular tally with zeroed counters.
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            hits: 0,
            visits: 0,
            xfer_bytes: 0,
            kind: EntityKind::Regular,
            dirty: true,
        }
    }

    /// A group aggregate keyed by `name` (e.g. all versions of one browser).
    pub fn group(name: &str) -> Self {
        Self {
            kind: EntityKind::Group,
            ..Self::new(name)
        }
    }

    /// Hash a tally lookup key.
    pub fn hash_key(value: &str) -> u64 {
        hash_str(0, value)
    }

    /// Account one occurrence.
    pub fn record_hit(&mut self, bytes: u64) {
        self.hits += 1;
        self.xfer_bytes += bytes;
        self.dirty = true;
    }

    /// Account the start of a visit attributed to this value.
    pub fn record_visit(&mut self) {
        self.visits += 1;
        self.dirty = true;
    }

    /// Clear the dirty flag after the tally has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Entity for Tally {
    type Params = ();

    fn matches(&self, key: &EntityKey<'_, ()>) -> bool {
        match key {
            EntityKey::Simple(s) => self.value == *s,
            EntityKey::Compound(_) => false,
        }
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.value)
    }

    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.value.len()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_hash() {
        let tally = Tally::new("Mozilla/5.0 (X11; Linux x86_64)");
        assert!(tally.matches(&EntityKey::Simple("Mozilla/5.0 (X11; Linux x86_64)")));
        assert_eq!(tally.hash(), Tally::hash_key("Mozilla/5.0 (X11; Linux x86_64)"));
    }

    #[test]
    fn test_group_shares_key_space_with_regular() {
        let regular = Tally::new("Firefox");
        let group = Tally::group("Firefox");
        assert_eq!(regular.hash(), group.hash());
        assert_ne!(Entity::kind(&regular), Entity::kind(&group));
    }

    #[test]
    fn test_counters() {
        let mut tally = Tally::new("https://example.com/");
        tally.record_hit(100);
        tally.record_hit(200);
        tally.record_visit();
        assert_eq!((tally.hits, tally.visits, tally.xfer_bytes), (2, 1, 300));
    }
}

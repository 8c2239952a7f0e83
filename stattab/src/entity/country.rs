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

/// Per-country aggregate, keyed by the two-letter country code.
///
/// The table is bounded by the number of countries and is never worth
/// evicting; its cache is typically constructed with a
/// [`stattab_memory::store::NullStore`] and left out of orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    /// Two-letter country code, `*` for unresolved addresses.
    pub ccode: String,
    /// Country name for the report.
    pub cdesc: String,

    /// Request count.
    pub hits: u64,
    /// Files requested.
    pub files: u64,
    /// Pages requested.
    pub pages: u64,
    /// Visits started.
    pub visits: u64,
    /// Transfer amount in bytes.
    pub xfer_bytes: u64,

    dirty: bool,
}

impl Country {
    /// A country aggregate with zeroed counters.
    pub fn new(ccode: &str, cdesc: &str) -> Self {
        Self {
            ccode: ccode.to_string(),
            cdesc: cdesc.to_string(),
            hits: 0,
            files: 0,
            pages: 0,
            visits: 0,
            xfer_bytes: 0,
            dirty: true,
        }
    }

    /// Hash a country lookup key.
    pub fn hash_key(ccode: &str) -> u64 {
        hash_str(0, ccode)
    }

    /// Account one request against this country.
    pub fn record_hit(&mut self, bytes: u64, file: bool, page: bool) {
        self.hits += 1;
        self.xfer_bytes += bytes;
        if file {
            self.files += 1;
        }
        if page {
            self.pages += 1;
        }
        self.dirty = true;
    }

    /// Clear the dirty flag after the country has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Entity for Country {
    type Params = ();

    fn matches(&self, key: &EntityKey<'_, ()>) -> bool {
        match key {
            EntityKey::Simple(s) => self.ccode == *s,
            EntityKey::Compound(_) => false,
        }
    }

    fn kind(&self) -> EntityKind {
        // Countries are already aggregates; there is nothing to group.
        EntityKind::Regular
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.ccode)
    }

    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.ccode.len() + self.cdesc.len()
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
        let country = Country::new("ca", "Canada");
        assert!(country.matches(&EntityKey::Simple("ca")));
        assert!(!country.matches(&EntityKey::Simple("us")));
        assert_eq!(country.hash(), Country::hash_key("ca"));
    }

    #[test]
    fn test_counters_accumulate() {
        let mut country = Country::new("ca", "Canada");
        country.mark_clean();
        country.record_hit(1024, true, true);
        country.record_hit(512, false, false);
        assert_eq!(
            (country.hits, country.files, country.pages, country.xfer_bytes),
            (2, 1, 1, 1536)
        );
        assert!(country.is_dirty());
    }
}

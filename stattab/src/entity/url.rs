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

/// Compound lookup key for the URL table.
///
/// Two requests for the same path with different query strings are distinct
/// URLs in the report, so both parts take part in the key comparison. The
/// hash covers the path only; variants of one path land in one bucket chain
/// and are told apart by the full comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParams {
    /// URL path, without the query string.
    pub path: String,
    /// Query string, empty when the request carried none.
    pub search_args: String,
}

impl UrlParams {
    /// Build a key from borrowed parts.
    pub fn new(path: &str, search_args: &str) -> Self {
        Self {
            path: path.to_string(),
            search_args: search_args.to_string(),
        }
    }
}

/// A requested URL, or a group aggregate over many URLs.
///
/// Group URLs are keyed by the configured group name in `path` with empty
/// `search_args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Url {
    /// URL path, or the group name for group aggregates.
    pub path: String,
    /// Query string.
    pub search_args: String,

    /// Request count.
    pub hits: u64,
    /// Files served.
    pub files: u64,
    /// Times this URL started a visit.
    pub entry: u64,
    /// Times this URL ended a visit.
    pub exit: u64,
    /// Transfer amount in bytes.
    pub xfer_bytes: u64,

    /// Average request processing time, in seconds.
    pub avg_time: f64,
    /// Maximum request processing time, in seconds.
    pub max_time: f64,

    /// Live visits whose entry URL is this one.
    pub visit_refs: u64,

    /// Marked as a conversion target in the configuration.
    pub target: bool,

    kind: EntityKind,
    dirty: bool,
}

impl Url {
    /// A regular URL with zeroed counters.
    pub fn new(path: &str, search_args: &str) -> Self {
        Self {
            path: path.to_string(),
            search_args: search_args.to_string(),
            hits: 0,
            files: 0,
            entry: 0,
            exit: 0,
            xfer_bytes: 0,
            avg_time: 0.0,
            max_time: 0.0,
            visit_refs: 0,
            target: false,
            kind: EntityKind::Regular,
            dirty: true,
        }
    }

    /// A group aggregate keyed by `name`.
    pub fn group(name: &str) -> Self {
        Self {
            kind: EntityKind::Group,
            ..Self::new(name, "")
        }
    }

    /// Hash a URL lookup key. The query string is deliberately left out; see
    /// [`UrlParams`].
    pub fn hash_key(path: &str) -> u64 {
        hash_str(0, path)
    }

    /// Account one request, folding its processing time into the running
    /// average.
    pub fn record_hit(&mut self, bytes: u64, file: bool, proc_time: f64) {
        self.avg_time = (self.avg_time * self.hits as f64 + proc_time) / (self.hits as f64 + 1.0);
        self.max_time = self.max_time.max(proc_time);
        self.hits += 1;
        self.xfer_bytes += bytes;
        if file {
            self.files += 1;
        }
        self.dirty = true;
    }

    /// Account this URL opening a visit.
    pub fn record_entry(&mut self) {
        self.entry += 1;
        self.visit_refs += 1;
        self.dirty = true;
    }

    /// Account this URL closing a visit, releasing the entry reference.
    pub fn record_exit(&mut self) {
        debug_assert!(self.visit_refs > 0);
        self.exit += 1;
        self.visit_refs -= 1;
        self.dirty = true;
    }

    /// Whether a live visit still references this URL.
    pub fn is_referenced(&self) -> bool {
        self.visit_refs > 0
    }

    /// Clear the dirty flag after the URL has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Entity for Url {
    type Params = UrlParams;

    fn matches(&self, key: &EntityKey<'_, UrlParams>) -> bool {
        match key {
            EntityKey::Simple(s) => self.path == *s && self.search_args.is_empty(),
            EntityKey::Compound(p) => self.path == p.path && self.search_args == p.search_args,
        }
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.path)
    }

    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.path.len() + self.search_args.len()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_distinguish_urls() {
        let plain = Url::new("/index.html", "");
        let search = Url::new("/index.html", "q=rust");

        // Same hash, different identity.
        assert_eq!(plain.hash(), search.hash());
        let key = EntityKey::Compound(&UrlParams::new("/index.html", "q=rust"));
        assert!(!plain.matches(&key));
        assert!(search.matches(&key));
    }

    #[test]
    fn test_simple_key_matches_bare_path_only() {
        let plain = Url::new("/download/", "");
        let search = Url::new("/download/", "v=2");
        assert!(plain.matches(&EntityKey::Simple("/download/")));
        assert!(!search.matches(&EntityKey::Simple("/download/")));
    }

    #[test]
    fn test_processing_time_running_average() {
        let mut url = Url::new("/app", "");
        url.record_hit(100, true, 2.0);
        url.record_hit(100, true, 4.0);
        assert_eq!(url.avg_time, 3.0);
        assert_eq!(url.max_time, 4.0);
        assert_eq!(url.hits, 2);
    }

    #[test]
    fn test_entry_exit_references() {
        let mut url = Url::new("/", "");
        url.record_entry();
        assert!(url.is_referenced());
        url.record_exit();
        assert!(!url.is_referenced());
        assert_eq!((url.entry, url.exit), (1, 1));
    }

    #[test]
    fn test_group_key() {
        let group = Url::group("images");
        assert_eq!(Entity::kind(&group), EntityKind::Group);
        assert!(group.matches(&EntityKey::Simple("images")));
    }
}

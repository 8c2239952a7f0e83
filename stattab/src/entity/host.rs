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

/// A host (client IP address) seen in the log, or a group aggregate over
/// many hosts.
///
/// Regular hosts are keyed by the IP address string; group hosts are keyed by
/// the configured group name and accumulate the counters of every member.
/// `visit_refs` and `download_refs` count live visit and download-job state
/// referencing this host; the owning store's evictability check keeps a
/// referenced host resident no matter how old its last request is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// IP address, or the group name for group aggregates.
    pub ipaddr: String,
    /// Resolved host name, empty until DNS resolution fills it in.
    pub name: String,
    /// Two-letter country code.
    pub ccode: String,
    /// City reported by geolocation.
    pub city: String,

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

    /// Live visits referencing this host.
    pub visit_refs: u64,
    /// Live download jobs referencing this host.
    pub download_refs: u64,

    /// Caught spamming.
    pub spammer: bool,
    /// Identified as a robot.
    pub robot: bool,

    kind: EntityKind,
    dirty: bool,
}

impl Host {
    /// A regular host keyed by `ipaddr`, with zeroed counters.
    pub fn new(ipaddr: &str) -> Self {
        Self {
            ipaddr: ipaddr.to_string(),
            name: String::new(),
            ccode: String::new(),
            city: String::new(),
            hits: 0,
            files: 0,
            pages: 0,
            visits: 0,
            xfer_bytes: 0,
            visit_refs: 0,
            download_refs: 0,
            spammer: false,
            robot: false,
            kind: EntityKind::Regular,
            dirty: true,
        }
    }

    /// A group aggregate keyed by `name`.
    pub fn group(name: &str) -> Self {
        Self {
            kind: EntityKind::Group,
            ..Self::new(name)
        }
    }

    /// Hash a host lookup key.
    pub fn hash_key(ipaddr: &str) -> u64 {
        hash_str(0, ipaddr)
    }

    /// The display name: the resolved name when known, the address otherwise.
    pub fn hostname(&self) -> &str {
        if self.name.is_empty() {
            &self.ipaddr
        } else {
            &self.name
        }
    }

    /// Account one request against this host.
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

    /// Account the start of a visit.
    pub fn record_visit_start(&mut self) {
        self.visits += 1;
        self.visit_refs += 1;
        self.dirty = true;
    }

    /// Release one live visit reference.
    pub fn release_visit(&mut self) {
        debug_assert!(self.visit_refs > 0);
        self.visit_refs -= 1;
        self.dirty = true;
    }

    /// Attach geolocation data.
    pub fn set_location(&mut self, ccode: &str, city: &str) {
        self.ccode = ccode.to_string();
        self.city = city.to_string();
        self.dirty = true;
    }

    /// Whether live visit or download state still references this host.
    pub fn is_referenced(&self) -> bool {
        self.visit_refs > 0 || self.download_refs > 0
    }

    /// Clear the dirty flag after the host has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Entity for Host {
    type Params = ();

    fn matches(&self, key: &EntityKey<'_, ()>) -> bool {
        match key {
            EntityKey::Simple(s) => self.ipaddr == *s,
            EntityKey::Compound(_) => false,
        }
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.ipaddr)
    }

    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.ipaddr.len()
            + self.name.len()
            + self.ccode.len()
            + self.city.len()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_hash_agree() {
        let host = Host::new("192.168.1.10");
        assert!(host.matches(&EntityKey::Simple("192.168.1.10")));
        assert!(!host.matches(&EntityKey::Simple("192.168.1.11")));
        assert_eq!(host.hash(), Host::hash_key("192.168.1.10"));
    }

    #[test]
    fn test_group_kind_and_key() {
        let group = Host::group("corporate-proxies");
        assert_eq!(Entity::kind(&group), EntityKind::Group);
        assert!(group.matches(&EntityKey::Simple("corporate-proxies")));
    }

    #[test]
    fn test_hostname_falls_back_to_address() {
        let mut host = Host::new("10.0.0.1");
        assert_eq!(host.hostname(), "10.0.0.1");
        host.name = "crawler.example.com".to_string();
        assert_eq!(host.hostname(), "crawler.example.com");
    }

    #[test]
    fn test_mutators_dirty_the_host() {
        let mut host = Host::new("10.0.0.1");
        host.mark_clean();
        assert!(!host.is_dirty());

        host.record_hit(512, true, false);
        assert!(host.is_dirty());
        assert_eq!((host.hits, host.files, host.pages, host.xfer_bytes), (1, 1, 0, 512));
    }

    #[test]
    fn test_visit_references() {
        let mut host = Host::new("10.0.0.1");
        assert!(!host.is_referenced());
        host.record_visit_start();
        assert!(host.is_referenced());
        assert_eq!(host.visits, 1);
        host.release_visit();
        assert!(!host.is_referenced());
    }

    #[test]
    fn test_size_estimate_tracks_strings() {
        let mut host = Host::new("10.0.0.1");
        let bare = host.estimated_size();
        host.name = "very.long.resolved.host.name.example.com".to_string();
        assert_eq!(host.estimated_size(), bare + host.name.len());
    }
}

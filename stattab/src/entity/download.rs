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

/// Compound lookup key for the download table: the same named download from
/// two hosts is two distinct jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadParams {
    /// Configured download name.
    pub name: String,
    /// Address of the downloading host.
    pub host_ip: String,
}

impl DownloadParams {
    /// Build a key from borrowed parts.
    pub fn new(name: &str, host_ip: &str) -> Self {
        Self {
            name: name.to_string(),
            host_ip: host_ip.to_string(),
        }
    }
}

/// A tracked download: one configured download name from one host.
///
/// A download with a job in flight must stay resident (and keeps its host
/// resident through the host's `download_refs`); the owning store's
/// evictability check reads [`Self::active`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    /// Configured download name.
    pub name: String,
    /// Address of the downloading host.
    pub host_ip: String,

    /// Completed job count.
    pub count: u64,
    /// Total requests across all jobs.
    pub sum_hits: u64,
    /// Total transfer across all jobs, in bytes.
    pub sum_xfer_bytes: u64,
    /// Total job duration, in minutes.
    pub sum_time: f64,

    /// A job is currently in flight.
    pub active: bool,

    dirty: bool,
}

impl Download {
    /// A download with zeroed counters and no job in flight.
    pub fn new(name: &str, host_ip: &str) -> Self {
        Self {
            name: name.to_string(),
            host_ip: host_ip.to_string(),
            count: 0,
            sum_hits: 0,
            sum_xfer_bytes: 0,
            sum_time: 0.0,
            active: false,
            dirty: true,
        }
    }

    /// Hash a download lookup key: the host part seeds the name part, so the
    /// same name from different hosts spreads across buckets.
    pub fn hash_key(name: &str, host_ip: &str) -> u64 {
        hash_str(hash_str(0, host_ip), name)
    }

    /// Average transfer per completed job, in bytes.
    pub fn avg_xfer_bytes(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_xfer_bytes as f64 / self.count as f64
        }
    }

    /// Average job duration, in minutes.
    pub fn avg_time(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_time / self.count as f64
        }
    }

    /// Open a job.
    pub fn start_job(&mut self) {
        self.active = true;
        self.dirty = true;
    }

    /// Account a request belonging to the job in flight.
    pub fn record_hit(&mut self, bytes: u64) {
        self.sum_hits += 1;
        self.sum_xfer_bytes += bytes;
        self.dirty = true;
    }

    /// Close the job in flight.
    pub fn finish_job(&mut self, duration_mins: f64) {
        debug_assert!(self.active);
        self.count += 1;
        self.sum_time += duration_mins;
        self.active = false;
        self.dirty = true;
    }

    /// Clear the dirty flag after the download has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Entity for Download {
    type Params = DownloadParams;

    fn matches(&self, key: &EntityKey<'_, DownloadParams>) -> bool {
        match key {
            EntityKey::Simple(_) => false,
            EntityKey::Compound(p) => self.name == p.name && self.host_ip == p.host_ip,
        }
    }

    fn kind(&self) -> EntityKind {
        // Downloads are never grouped.
        EntityKind::Regular
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.name, &self.host_ip)
    }

    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.name.len() + self.host_ip.len()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

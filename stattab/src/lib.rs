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

//! stattab keeps the per-entity statistics tables of a web server log
//! analyzer (hosts, URLs, downloads, countries, and the smaller value
//! tallies) in memory while a run processes log records, and keeps the
//! combined working set under a global memory ceiling by evicting stale
//! entries to a caller-supplied durable store.
//!
//! The engine lives in `stattab-memory`; this crate adds the concrete entity
//! types recovered from server logs and re-exports the public surface.
//!
//! # Example
//!
//! ```
//! use stattab::entity::Host;
//! use stattab::prelude::*;
//!
//! let mut hosts = Cache::new(CacheConfig::with_expected_entries(4096), NullStore);
//!
//! let timestamp = 1_700_000_000;
//! let hash = Host::hash_key("10.0.0.1");
//! if hosts.lookup_and_refresh(hash, &EntityKey::Simple("10.0.0.1"), timestamp)?.is_none() {
//!     hosts.insert(Host::new("10.0.0.1"), timestamp)?;
//! }
//!
//! assert_eq!(hosts.entity_count(), 1);
//! # Ok::<(), stattab::prelude::Error>(())
//! ```

/// Concrete entity types, one per statistics table.
pub mod entity;

/// Re-exports of the most commonly used types.
pub mod prelude;

pub use stattab_common as common;
pub use stattab_memory as memory;

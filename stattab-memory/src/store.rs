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

use stattab_common::error::Result;

use crate::entity::Entity;

/// The persistence contract a cache owner supplies at construction.
///
/// `is_evictable` encodes domain knowledge the cache does not have (e.g. a
/// host with an open visit cannot be evicted while the visit references it).
/// `externalize` persists an evicted entity to the durable store; it receives
/// the entity by value because the cache has already relinquished every
/// reference to it. The write is expected to be an upsert keyed by the
/// entity's identity, idempotent under retry of the same entity.
///
/// If `externalize` fails, the entity's memory is still released exactly once
/// and the error surfaces from `evict_up_to`; the run driver decides what to
/// do with a store that now reflects a strict prefix of the eviction work.
pub trait Store<E>
where
    E: Entity,
{
    /// Whether the entity may be evicted right now.
    ///
    /// Entities with live cross-references survive eviction even when old;
    /// the eviction scan skips them in place and keeps going.
    fn is_evictable(&self, _entity: &E) -> bool {
        true
    }

    /// Persist an evicted entity.
    fn externalize(&mut self, entity: E) -> Result<()>;
}

/// A store that drops everything it is given.
///
/// For tables that are never meaningfully evicted (e.g. the per-country
/// aggregates, which fit in memory for any realistic month) or for tools that
/// only need the in-memory view.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl<E> Store<E> for NullStore
where
    E: Entity,
{
    fn externalize(&mut self, _entity: E) -> Result<()> {
        Ok(())
    }
}

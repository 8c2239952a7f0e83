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

/// Type discriminator for cached entities.
///
/// Caches may contain primary objects, such as user agents or URLs, and
/// object groups, such as all versions of a particular browser or all URLs
/// under a selected directory. Group entities are permanently memory-resident
/// and never selected for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A primary object keyed by its own value.
    Regular,
    /// An aggregate over many primary objects, exempt from eviction.
    Group,
}

/// The shape of a lookup key.
///
/// Most tables are searched with a plain string key. Tables whose identity
/// spans several fields (e.g. a download job keyed by host address and job
/// name) are searched with a type-specific parameter block instead. The
/// closed set of shapes lets an entity dispatch the comparison with a single
/// `match`.
#[derive(Debug)]
pub enum EntityKey<'a, P> {
    /// A plain string key.
    Simple(&'a str),
    /// A type-specific compound key.
    Compound(&'a P),
}

/// The capability contract every cached entity implements.
///
/// This is deliberately a capability trait rather than a base type: the cache
/// owns entities of exactly one concrete kind per instantiation and only ever
/// talks to them through these five hooks.
pub trait Entity: 'static {
    /// The compound-key parameter block for this entity type.
    ///
    /// Entity types searched only by string key use `()` and never match a
    /// compound lookup.
    type Params;

    /// Key-match test: is this entity the one the key addresses?
    fn matches(&self, key: &EntityKey<'_, Self::Params>) -> bool;

    /// The type discriminator of this entity.
    fn kind(&self) -> EntityKind;

    /// The hash value derived from this entity's key.
    ///
    /// Must be stable for the lifetime of the entity and equal to the hash a
    /// caller derives from the matching lookup key.
    fn hash(&self) -> u64;

    /// Serialized-size estimate used for memory accounting.
    fn estimated_size(&self) -> usize;

    /// Whether the entity carries changes not yet persisted.
    fn is_dirty(&self) -> bool;
}

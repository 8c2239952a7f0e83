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

use bitflags::bitflags;
use stattab_common::arena::NodeId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct NodeFlags: u8 {
        const IN_TIME_LIST = 0b0000_0001;
        const IN_GROUP_LIST = 0b0000_0010;
    }
}

/// The wrapper that owns one resident entity.
///
/// A node is a member of exactly one bucket chain (singly linked through
/// `bucket_next`) and of exactly one eviction-index list (doubly linked
/// through `prev`/`next`): the time-ordered list for regular entities, the
/// group list for group entities. Destroying the node destroys the entity.
pub(crate) struct Node<E> {
    pub entity: E,

    /// The entity's key hash, cached so bucket unlinking never re-hashes.
    pub hash: u64,
    /// Last insert/refresh timestamp. Meaningful for regular entities only.
    pub timestamp: u64,
    /// Bytes charged against the cache for this node at insert time.
    ///
    /// Released verbatim at eviction so the cache-level memory counter stays
    /// exact even when the entity grows while resident.
    pub charged: usize,

    pub bucket_next: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,

    pub flags: NodeFlags,
}

impl<E> Node<E> {
    pub fn new(entity: E, hash: u64, timestamp: u64, charged: usize) -> Self {
        Self {
            entity,
            hash,
            timestamp,
            charged,
            bucket_next: None,
            prev: None,
            next: None,
            flags: NodeFlags::empty(),
        }
    }
}

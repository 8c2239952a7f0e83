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

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// A stable handle to an occupied slot in an [`Arena`].
///
/// The handle stays valid until the slot is freed, no matter how many other
/// slots are allocated or freed in between. The high bit is always set so that
/// `Option<NodeId>` is pointer-sized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(NonZeroUsize);

impl NodeId {
    const MASK: usize = 1 << (usize::BITS - 1);

    fn new(index: usize) -> Self {
        debug_assert_eq!(index & Self::MASK, 0);
        // SAFETY: the mask bit guarantees a non-zero value.
        unsafe { Self(NonZeroUsize::new_unchecked(index | Self::MASK)) }
    }

    /// Get the slot index of the handle.
    pub fn index(&self) -> usize {
        self.0.get() & !Self::MASK
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Vacant(usize),
    Occupied(T),
}

/// A slot arena that owns values and hands out stable [`NodeId`] handles.
///
/// Freed slots are kept on an internal free list and reused by later
/// allocations.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    len: usize,
    next: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            next: 0,
        }
    }

    /// Create an empty arena with the given slot capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
            next: 0,
        }
    }

    /// Move a value into the arena and return its handle.
    pub fn alloc(&mut self, val: T) -> NodeId {
        let index = self.next;
        self.len += 1;

        if index == self.slots.len() {
            self.slots.push(Slot::Occupied(val));
            self.next = index + 1;
        } else {
            self.next = match self.slots.get(index) {
                Some(&Slot::Vacant(next)) => next,
                _ => unreachable!(),
            };
            self.slots[index] = Slot::Occupied(val);
        }

        NodeId::new(index)
    }

    /// Move the value out of the arena, vacating its slot.
    ///
    /// Returns `None` if the slot is already vacant.
    pub fn free(&mut self, id: NodeId) -> Option<T> {
        let index = id.index();
        let slot = self.slots.get_mut(index)?;

        if matches!(slot, Slot::Vacant(_)) {
            return None;
        }

        let slot = std::mem::replace(slot, Slot::Vacant(self.next));

        match slot {
            Slot::Vacant(_) => unreachable!(),
            Slot::Occupied(val) => {
                self.len -= 1;
                self.next = index;
                Some(val)
            }
        }
    }

    /// Get the immutable reference of the value by handle.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(val)) => Some(val),
            _ => None,
        }
    }

    /// Get the mutable reference of the value by handle.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(val)) => Some(val),
            _ => None,
        }
    }

    /// Count of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the arena holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all values and reset the arena, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_node_id_size() {
        assert_eq!(
            std::mem::size_of::<Option<NodeId>>(),
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_alloc_free_reuse() {
        let mut arena = Arena::new();

        let a = arena.alloc("a");
        let b = arena.alloc("b");
        let c = arena.alloc("c");
        assert_eq!(arena.len(), 3);

        assert_eq!(arena.free(b), Some("b"));
        assert_eq!(arena.free(b), None);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), None);
        assert_eq!(arena.get(c), Some(&"c"));

        // The vacated slot is reused.
        let d = arena.alloc("d");
        assert_eq!(d.index(), b.index());
        assert_eq!(arena.get(d), Some(&"d"));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = Arena::new();
        let id = arena.alloc(41);
        *arena.get_mut(id).unwrap() += 1;
        assert_eq!(arena.get(id), Some(&42));
    }

    #[test]
    fn test_random_churn() {
        use rand::prelude::*;

        let mut rng = rand::rng();
        let mut arena = Arena::new();
        let mut live: Vec<(NodeId, u32)> = Vec::new();

        for i in 0..10_000u32 {
            if live.is_empty() || rng.random_bool(0.6) {
                live.push((arena.alloc(i), i));
            } else {
                let (id, val) = live.swap_remove(rng.random_range(0..live.len()));
                assert_eq!(arena.free(id), Some(val));
            }
        }

        assert_eq!(arena.len(), live.len());
        for (id, val) in live {
            assert_eq!(arena.get(id), Some(&val));
        }
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::with_capacity(16);
        let ids: Vec<_> = (0..16).map(|i| arena.alloc(i)).collect();
        arena.clear();
        assert!(arena.is_empty());
        for id in ids {
            assert_eq!(arena.get(id), None);
        }
        let id = arena.alloc(7);
        assert_eq!(id.index(), 0);
    }
}

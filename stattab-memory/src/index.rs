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

use stattab_common::{
    arena::{Arena, NodeId},
    error::{Error, Result},
};

use crate::node::{Node, NodeFlags};

/// The secondary index used purely to pick eviction candidates.
///
/// Two independent intrusive lists over the same arena of nodes:
///
/// - the time-ordered list holds regular entities, monotonically
///   non-decreasing in timestamp from head (oldest) to tail;
/// - the group list holds group entities in no particular order; it exists
///   only so `clear` and teardown can reach them.
///
/// A node is on exactly one of the two lists for its entire resident life.
pub(crate) struct EvictionIndex {
    time_head: Option<NodeId>,
    time_tail: Option<NodeId>,
    group_head: Option<NodeId>,
}

impl EvictionIndex {
    pub fn new() -> Self {
        Self {
            time_head: None,
            time_tail: None,
            group_head: None,
        }
    }

    /// Oldest regular node, the eviction scan entry point.
    pub fn time_head(&self) -> Option<NodeId> {
        self.time_head
    }

    /// Timestamp of the newest regular node, if any.
    pub fn tail_timestamp<E>(&self, arena: &Arena<Node<E>>) -> Option<u64> {
        self.time_tail.map(|id| arena.get(id).unwrap().timestamp)
    }

    /// Enforce the ascending-timestamp invariant for an upcoming insert or
    /// refresh. Equal timestamps are fine; the list must be monotonically
    /// non-decreasing, and log records often share one second.
    pub fn check_ascending<E>(&self, arena: &Arena<Node<E>>, timestamp: u64) -> Result<()> {
        match self.tail_timestamp(arena) {
            Some(tail) if timestamp < tail => Err(Error::ordering_violation(tail, timestamp)),
            _ => Ok(()),
        }
    }

    /// Append a node at the tail of the time-ordered list.
    ///
    /// The caller has already run [`Self::check_ascending`] and stamped the
    /// node.
    pub fn push_time<E>(&mut self, arena: &mut Arena<Node<E>>, id: NodeId) {
        debug_assert!(
            self.tail_timestamp(arena)
                .is_none_or(|tail| arena.get(id).unwrap().timestamp >= tail)
        );

        let tail = self.time_tail;
        {
            let node = arena.get_mut(id).unwrap();
            debug_assert!(node.flags.is_empty());
            node.prev = tail;
            node.next = None;
            node.flags.insert(NodeFlags::IN_TIME_LIST);
        }

        match tail {
            Some(tail) => arena.get_mut(tail).unwrap().next = Some(id),
            None => self.time_head = Some(id),
        }
        self.time_tail = Some(id);
    }

    /// Link a node into the group list.
    pub fn push_group<E>(&mut self, arena: &mut Arena<Node<E>>, id: NodeId) {
        let head = self.group_head;
        {
            let node = arena.get_mut(id).unwrap();
            debug_assert!(node.flags.is_empty());
            node.prev = None;
            node.next = head;
            node.flags.insert(NodeFlags::IN_GROUP_LIST);
        }

        if let Some(head) = head {
            arena.get_mut(head).unwrap().prev = Some(id);
        }
        self.group_head = Some(id);
    }

    /// Unlink a node from whichever list it is on.
    pub fn unlink<E>(&mut self, arena: &mut Arena<Node<E>>, id: NodeId) {
        let (prev, next, flags) = {
            let node = arena.get_mut(id).unwrap();
            let out = (node.prev, node.next, node.flags);
            node.prev = None;
            node.next = None;
            node.flags = NodeFlags::empty();
            out
        };

        if flags.contains(NodeFlags::IN_TIME_LIST) {
            match prev {
                Some(prev) => arena.get_mut(prev).unwrap().next = next,
                None => self.time_head = next,
            }
            match next {
                Some(next) => arena.get_mut(next).unwrap().prev = prev,
                None => self.time_tail = prev,
            }
        } else {
            debug_assert!(flags.contains(NodeFlags::IN_GROUP_LIST));
            match prev {
                Some(prev) => arena.get_mut(prev).unwrap().next = next,
                None => self.group_head = next,
            }
            if let Some(next) = next {
                arena.get_mut(next).unwrap().prev = prev;
            }
        }
    }

    /// Forget both lists. The caller is resetting the arena as well.
    pub fn clear(&mut self) {
        self.time_head = None;
        self.time_tail = None;
        self.group_head = None;
    }
}

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

use std::{cell::RefCell, rc::Rc};

use stattab_common::{
    error::{Error, Result},
    hasher::hash_str,
};

use crate::{
    entity::{Entity, EntityKey, EntityKind},
    store::Store,
};

/// A minimal entity for engine tests: a string key, a fixed size estimate,
/// and a pin flag the recording store's evictability check honors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntity {
    /// The key string.
    pub key: String,
    /// Regular or group.
    pub kind: EntityKind,
    /// Reported serialized-size estimate.
    pub size: usize,
    /// Reported dirty flag.
    pub dirty: bool,
    /// When set, the recording store vetoes eviction.
    pub pinned: bool,
}

impl TestEntity {
    /// A regular entity with a 100-byte size estimate.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: EntityKind::Regular,
            size: 100,
            dirty: true,
            pinned: false,
        }
    }

    /// A group aggregate.
    pub fn group(key: &str) -> Self {
        Self {
            kind: EntityKind::Group,
            ..Self::new(key)
        }
    }

    /// Override the size estimate.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Mark the entity as referenced by live state.
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Hash a lookup key the way the entity hashes its own.
    pub fn hash_key(key: &str) -> u64 {
        hash_str(0, key)
    }
}

impl Entity for TestEntity {
    type Params = ();

    fn matches(&self, key: &EntityKey<'_, ()>) -> bool {
        match key {
            EntityKey::Simple(s) => self.key == *s,
            EntityKey::Compound(_) => false,
        }
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn hash(&self) -> u64 {
        Self::hash_key(&self.key)
    }

    fn estimated_size(&self) -> usize {
        self.size
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// A shared externalization log for asserting cross-cache ordering.
pub type SharedLog = Rc<RefCell<Vec<String>>>;

/// Create an empty shared log.
pub fn shared_log() -> SharedLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A store that records every externalized key, optionally appends to a
/// [`SharedLog`] shared across caches, and can inject a failure on a chosen
/// key.
#[derive(Debug, Default)]
pub struct RecordingStore {
    /// Keys externalized through this store, in order.
    pub externalized: Vec<String>,
    /// Key that triggers an injected store failure.
    pub fail_on: Option<String>,
    /// Cross-cache ordering log, if any.
    pub log: Option<SharedLog>,
}

impl RecordingStore {
    /// A recording store appending to the given shared log.
    pub fn with_log(log: SharedLog) -> Self {
        Self {
            log: Some(log),
            ..Default::default()
        }
    }
}

impl Store<TestEntity> for RecordingStore {
    fn is_evictable(&self, entity: &TestEntity) -> bool {
        !entity.pinned
    }

    fn externalize(&mut self, entity: TestEntity) -> Result<()> {
        if self.fail_on.as_deref() == Some(entity.key.as_str()) {
            return Err(Error::store("injected store failure").with_context("key", entity.key));
        }
        if let Some(log) = &self.log {
            log.borrow_mut().push(entity.key.clone());
        }
        self.externalized.push(entity.key);
        Ok(())
    }
}

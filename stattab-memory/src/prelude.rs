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

//! Re-exports of the commonly used types and traits.

pub use stattab_common::error::{Error, ErrorKind, Result};

pub use crate::{
    cache::{
        Cache, CacheConfig, EvictionReport, Iter, LARGE_BUCKET_COUNT, MEDIUM_BUCKET_COUNT,
        MOVE_TO_FRONT_THRESHOLD, NODE_OVERHEAD, SMALL_BUCKET_COUNT,
    },
    entity::{Entity, EntityKey, EntityKind},
    orchestrator::{
        EvictableCache, EvictionOrchestrator, MaintenanceReport, OrchestratorConfig,
        DEFAULT_CEILING_BYTES, EVICTION_SLACK_DIVISOR,
    },
    store::{NullStore, Store},
};

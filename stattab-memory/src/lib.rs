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

//! The in-memory cache engine behind every per-entity statistics table of the
//! log analyzer, plus the multi-cache eviction orchestrator that keeps the
//! total working set under one global memory ceiling during a processing run.
//!
//! The engine is single-threaded by contract: it is driven exclusively by the
//! sequential log-processing loop and by the periodic maintenance point that
//! invokes the orchestrator. It performs no I/O of its own; evicted entities
//! are handed to a [`store::Store`] supplied by the owner.

/// The statistics cache over one entity kind.
pub mod cache;
/// The entity capability contract.
pub mod entity;
/// The eviction index: time-ordered and group lists.
mod index;
/// The wrapper node owning one resident entity.
mod node;
/// The multi-cache eviction orchestrator.
pub mod orchestrator;
/// The persistence callback contract.
pub mod store;

/// Test utilities.
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

/// Re-exports of the most commonly used types.
pub mod prelude;

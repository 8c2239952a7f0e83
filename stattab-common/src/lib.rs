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

//! Shared components for the stattab workspace.

/// Slot arena with stable integer handles.
pub mod arena;
/// Power-of-two helpers used for bucket sizing.
pub mod bits;
/// Error types for the stattab workspace.
pub mod error;
/// The sdbm incremental hash used for entity keys.
pub mod hasher;

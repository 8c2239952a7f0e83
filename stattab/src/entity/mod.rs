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

//! One entity type per statistics table the analyzer maintains.
//!
//! Every type implements [`stattab_memory::entity::Entity`] and carries the
//! counters the report generator reads. Mutators set the dirty flag; the
//! owning store clears it via `mark_clean` after persisting. All types expose
//! a `hash_key` associated function so the log-processing loop can hash a
//! search key without constructing an entity first.

mod country;
mod download;
mod host;
mod tally;
mod url;

pub use country::Country;
pub use download::{Download, DownloadParams};
pub use host::Host;
pub use tally::Tally;
pub use url::{Url, UrlParams};

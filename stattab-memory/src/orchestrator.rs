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
use stattab_common::error::{Error, ErrorKind, Result};

use crate::{
    cache::{Cache, EvictionReport},
    entity::Entity,
    store::Store,
};

/// Divisor of the ceiling that sets the eviction slack.
///
/// Eviction overshoots the ceiling by `ceiling / EVICTION_SLACK_DIVISOR`
/// (20%) so the very next small increment does not re-trigger a pass. A
/// hysteresis band, not a precise cut; empirical, preserved from the original
/// system.
pub const EVICTION_SLACK_DIVISOR: usize = 5;

/// Default global memory ceiling for a processing run.
pub const DEFAULT_CEILING_BYTES: usize = 64 * 1024 * 1024;

/// Eviction orchestrator config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Global ceiling the combined working set of all caches converges to.
    pub ceiling_bytes: usize,
    /// See [`EVICTION_SLACK_DIVISOR`].
    pub slack_divisor: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: DEFAULT_CEILING_BYTES,
            slack_divisor: EVICTION_SLACK_DIVISOR,
        }
    }
}

/// The view of a cache the orchestrator works through.
///
/// Object-safe so caches over different entity kinds can sit in one list.
pub trait EvictableCache {
    /// Current memory estimate of the cache.
    fn estimated_memory_bytes(&self) -> usize;

    /// Number of resident entities.
    fn entity_count(&self) -> usize;

    /// Evict entities not newer than `cutoff` until the memory estimate
    /// drops to `target_bytes` (zero: no budget, evict all old entries).
    fn evict_up_to(&mut self, cutoff: u64, target_bytes: usize) -> Result<EvictionReport>;

    /// Externalize every evictable entity.
    fn flush(&mut self) -> Result<EvictionReport> {
        self.evict_up_to(u64::MAX, 0)
    }
}

impl<E, S> EvictableCache for Cache<E, S>
where
    E: Entity,
    S: Store<E>,
{
    fn estimated_memory_bytes(&self) -> usize {
        Cache::estimated_memory_bytes(self)
    }

    fn entity_count(&self) -> usize {
        Cache::entity_count(self)
    }

    fn evict_up_to(&mut self, cutoff: u64, target_bytes: usize) -> Result<EvictionReport> {
        Cache::evict_up_to(self, cutoff, target_bytes)
    }
}

/// What one orchestration pass did across all caches.
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    /// Combined memory estimate before the pass.
    pub total_before: usize,
    /// Combined memory estimate after the pass.
    pub total_after: usize,
    /// Per-cache eviction reports, in pass order.
    pub passes: Vec<(String, EvictionReport)>,
}

impl MaintenanceReport {
    /// Entities evicted across all caches.
    pub fn total_evicted(&self) -> u64 {
        self.passes.iter().map(|(_, report)| report.evicted).sum()
    }
}

/// Keeps the combined working set of several independent caches under one
/// global memory ceiling, shrinking each cache in proportion to its share of
/// the total.
///
/// Cache sizes differ by orders of magnitude between entity kinds (a typical
/// log has far more URLs than user names); a fixed per-cache quota would
/// either starve the large tables or never touch the small ones, while the
/// proportional cut converges the whole working set in one pass regardless
/// of skew.
///
/// # Externalization order
///
/// Both [`Self::maintain`] and [`Self::flush`] visit caches in the order the
/// caller lists them, and that order is a contract: a cache must come before
/// every cache its entities reference, so nothing is persisted while pointing
/// at an entity that is neither persisted nor resident. For the log analyzer
/// that means downloads, then hosts (with their embedded visits), then URLs,
/// then everything else. The caches themselves know nothing about
/// cross-entity references and cannot enforce this.
#[derive(Debug)]
pub struct EvictionOrchestrator {
    config: OrchestratorConfig,
}

impl EvictionOrchestrator {
    /// Create an orchestrator.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        if config.slack_divisor == 0 {
            return Err(Error::new(ErrorKind::Config, "slack_divisor must be non-zero"));
        }
        Ok(Self { config })
    }

    /// The active config.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Compute the per-cache target sizes for one pass.
    ///
    /// Returns `None` when the combined size is already under the ceiling
    /// (callers skip eviction entirely). Entries for caches holding no memory
    /// are `None`: their share of the overflow is zero and handing them the
    /// zero-target "evict everything" sentinel would be wrong.
    pub fn compute_targets(&self, sizes: &[usize]) -> Option<Vec<Option<usize>>> {
        let total: usize = sizes.iter().sum();
        if total <= self.config.ceiling_bytes {
            return None;
        }

        let overflow = total - self.config.ceiling_bytes + self.config.ceiling_bytes / self.config.slack_divisor;

        let targets = sizes
            .iter()
            .map(|&size| {
                if size == 0 {
                    return None;
                }
                let cut = (overflow as u128 * size as u128 / total as u128) as usize;
                Some(size.saturating_sub(cut))
            })
            .collect();

        Some(targets)
    }

    /// One periodic maintenance pass.
    ///
    /// `cutoff` is supplied by the log-processing driver (typically the
    /// current log time minus the session-timeout window) and is identical
    /// for every cache in the pass. Caches are visited in list order; see the
    /// type docs for the ordering contract. A store failure aborts the pass
    /// and propagates; earlier caches keep their completed evictions.
    pub fn maintain(&self, caches: &mut [(&str, &mut dyn EvictableCache)], cutoff: u64) -> Result<MaintenanceReport> {
        let sizes: Vec<usize> = caches.iter().map(|(_, cache)| cache.estimated_memory_bytes()).collect();
        let total_before: usize = sizes.iter().sum();

        let Some(targets) = self.compute_targets(&sizes) else {
            tracing::debug!(
                total_before,
                ceiling = self.config.ceiling_bytes,
                "working set under ceiling, skipping eviction"
            );
            return Ok(MaintenanceReport {
                total_before,
                total_after: total_before,
                passes: Vec::new(),
            });
        };

        let mut report = MaintenanceReport {
            total_before,
            total_after: 0,
            passes: Vec::new(),
        };

        for ((name, cache), target) in caches.iter_mut().zip(targets) {
            let Some(target) = target else {
                continue;
            };
            let pass = cache.evict_up_to(cutoff, target)?;
            tracing::debug!(
                name = %name,
                target,
                evicted = pass.evicted,
                retained = pass.retained,
                "cache maintenance pass"
            );
            report.passes.push((name.to_string(), pass));
        }

        report.total_after = caches.iter().map(|(_, cache)| cache.estimated_memory_bytes()).sum();
        Ok(report)
    }

    /// The end-of-run full flush: externalize every evictable entity from
    /// every cache, in list order.
    pub fn flush(&self, caches: &mut [(&str, &mut dyn EvictableCache)]) -> Result<MaintenanceReport> {
        let total_before: usize = caches.iter().map(|(_, cache)| cache.estimated_memory_bytes()).sum();

        let mut report = MaintenanceReport {
            total_before,
            total_after: 0,
            passes: Vec::new(),
        };

        for (name, cache) in caches.iter_mut() {
            let pass = cache.flush()?;
            tracing::debug!(name = %name, evicted = pass.evicted, retained = pass.retained, "cache flushed");
            report.passes.push((name.to_string(), pass));
        }

        report.total_after = caches.iter().map(|(_, cache)| cache.estimated_memory_bytes()).sum();
        Ok(report)
    }
}

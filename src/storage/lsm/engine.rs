//! LSM engine: memtable + run vector orchestration
//!
//! ## Control flow
//! - Writes land in the memtable; a full memtable flushes through the
//!   partitioning strategy into new level-0 runs
//! - After every flush the merge policy is consulted in a loop until it
//!   stops firing
//! - Range queries fan out across the memtable and all runs whose total
//!   MBR intersects the query, then reconcile: newest version wins,
//!   tombstones hide
//!
//! ## Locking
//! Two locks, never held together: the memtable's own mutex and the
//! engine lock around the run vector. A query drains its memtable matches
//! first, then clones the run list under the read lock and scans without
//! holding it; runs are immutable and shared via `Arc`.

use super::compaction::{merge_runs, MergePolicy};
use super::memtable::Memtable;
use super::metrics::{EngineMetrics, MetricsSnapshot};
use super::partitioning::PartitioningStrategy;
use super::sorted_run::{RunClock, SortedRun};
use super::latest_versions;
use crate::config::EngineConfig;
use crate::error::{Result, StorageError};
use crate::types::{Mbr, Point, SpatialRecord};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Write-optimized spatial LSM engine over D-dimensional point records
pub struct LsmEngine<V> {
    dimensions: usize,
    memtable: Memtable<V>,
    /// Engine lock: insertion-ordered run vector; recency lives in the
    /// run timestamps, not the ordering
    runs: RwLock<Vec<Arc<SortedRun<V>>>>,
    config: EngineConfig,
    clock: RunClock,
    metrics: EngineMetrics,
}

impl<V: Clone + Default> LsmEngine<V> {
    /// Engine with `Binomial(max_runs_before_merge)` compaction and the
    /// default Size partitioning
    pub fn new(dimensions: usize, max_runs_before_merge: usize) -> Result<Self> {
        Self::with_config(
            dimensions,
            EngineConfig::default().with_merge_policy(MergePolicy::Binomial {
                k: max_runs_before_merge.max(2),
            }),
        )
    }

    pub fn with_config(dimensions: usize, config: EngineConfig) -> Result<Self> {
        if dimensions == 0 {
            return Err(StorageError::InvalidArgument(
                "dimensions must be at least 1".into(),
            ));
        }
        Ok(Self {
            dimensions,
            memtable: Memtable::new(dimensions, config.memtable_max_bytes, config.value_bytes),
            runs: RwLock::new(Vec::new()),
            config,
            clock: RunClock::new(),
            metrics: EngineMetrics::new(),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Insert a point record. A full memtable triggers a flush and one
    /// retry; `Ok(false)` means the record still did not fit.
    pub fn insert(&self, point: Point, value: V) -> Result<bool> {
        self.check_dims(point.dimensions())?;
        let record = SpatialRecord::new(point, value);
        let stored = if self.memtable.insert(record.clone()) {
            true
        } else {
            self.flush()?;
            self.memtable.insert(record)
        };
        if stored {
            self.metrics.record_write();
        }
        Ok(stored)
    }

    /// Record a deletion via tombstone; hides the point from queries
    /// until a merge retires both versions
    pub fn delete(&self, point: Point) -> Result<bool> {
        self.check_dims(point.dimensions())?;
        self.memtable.delete(point);
        self.metrics.record_write();
        Ok(true)
    }

    /// Axis-aligned range query over live records
    pub fn range_query(&self, query: &Mbr) -> Result<Vec<SpatialRecord<V>>> {
        self.check_dims(query.dimensions())?;
        if !query.is_valid() {
            return Err(StorageError::InvalidMbr("query lower > upper".into()));
        }
        let start = Instant::now();

        // Memtable first (newest source), then runs newest-first; the
        // reconciliation keeps the first version of each point it sees
        let mut candidates = self.memtable.range_scan_raw(query);

        let snapshot: Vec<Arc<SortedRun<V>>> = self.runs.read().clone();
        let mut by_recency = snapshot;
        by_recency.sort_by_key(|r| std::cmp::Reverse(r.timestamp()));

        let mut runs_scanned = 0;
        for run in &by_recency {
            if run.total_mbr().intersects(query) {
                runs_scanned += 1;
                candidates.extend(run.range_search(query));
            }
        }

        let mut results = latest_versions(candidates);
        results.retain(|r| !r.tombstone);

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_query(runs_scanned, latency_ms);
        Ok(results)
    }

    /// Exact-point lookup: a degenerate range query (0 or 1 records)
    pub fn point_query(&self, point: &Point) -> Result<Vec<SpatialRecord<V>>> {
        self.range_query(&Mbr::from_point(point))
    }

    /// Drain the memtable into new level-0 runs, then let the merge
    /// policy run until quiescent
    pub fn flush(&self) -> Result<()> {
        let records = self.memtable.drain();
        if records.is_empty() {
            return Ok(());
        }
        let flushed = records.len();
        let new_runs = self.config.partitioning.partition(
            records,
            0,
            self.dimensions,
            self.config.max_component_size,
            self.config.comparator,
            self.config.rtree_fanout,
            &self.clock,
        )?;

        {
            let mut runs = self.runs.write();
            runs.extend(new_runs.into_iter().map(Arc::new));
            debug!(flushed, components = runs.len(), "memtable flushed");
        }
        self.metrics.record_flush(flushed);

        self.run_merges()
    }

    /// Apply the merge policy until it stops firing
    fn run_merges(&self) -> Result<()> {
        loop {
            let snapshot: Vec<Arc<SortedRun<V>>> = self.runs.read().clone();
            if !self.config.merge_policy.should_merge(&snapshot) {
                return Ok(());
            }
            let selected = self.config.merge_policy.select(&snapshot);
            if selected.is_empty() {
                return Ok(());
            }
            let target_level = self.config.merge_policy.output_level(&selected);

            // Tombstones may be dropped only when the merged output
            // becomes the oldest data in the engine: no run outside the
            // selection is older than any selected run
            let max_selected = selected.iter().map(|r| r.timestamp()).max().unwrap_or(0);
            let drop_tombstones = snapshot
                .iter()
                .filter(|r| !selected.iter().any(|s| s.timestamp() == r.timestamp()))
                .all(|r| r.timestamp() > max_selected);

            let merged = merge_runs(
                &selected,
                target_level,
                self.dimensions,
                self.config.rtree_fanout,
                drop_tombstones,
                &self.clock,
            )?;
            let merged_len = merged.len();

            {
                let mut runs = self.runs.write();
                // Swap only if the selection is still intact
                let all_present = selected
                    .iter()
                    .all(|s| runs.iter().any(|r| r.timestamp() == s.timestamp()));
                if !all_present {
                    continue;
                }
                runs.retain(|r| !selected.iter().any(|s| s.timestamp() == r.timestamp()));
                runs.push(Arc::new(merged));
                debug!(
                    merged = selected.len(),
                    records = merged_len,
                    level = target_level,
                    drop_tombstones,
                    "runs merged"
                );
            }
            self.metrics.record_merge(merged_len);
        }
    }

    /// Number of runs currently held
    pub fn component_count(&self) -> usize {
        self.runs.read().len()
    }

    /// Records across memtable and runs, tombstones included
    pub fn total_records(&self) -> usize {
        let in_runs: usize = self.runs.read().iter().map(|r| r.len()).sum();
        self.memtable.len() + in_runs
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn check_dims(&self, actual: usize) -> Result<()> {
        if actual != self.dimensions {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimensions,
                actual,
            });
        }
        Ok(())
    }
}

//! Sorted run: the immutable on-"disk" component of the LSM-tree
//!
//! Each run owns a bulk-loaded R-tree plus its total MBR. Range search is
//! two-stage: the total MBR filters the whole run in O(D) before the tree
//! is ever touched. That coarse prune is the engine's primary read
//! optimization.

use crate::error::{Result, StorageError};
use crate::index::RTree;
use crate::types::{Mbr, SpatialRecord};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic timestamp source for runs, local to one engine.
///
/// Wall-clock time collides under millisecond resolution, so recency is
/// encoded with a plain counter instead.
#[derive(Debug, Default)]
pub struct RunClock(AtomicU64);

impl RunClock {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Immutable batch of records with a local spatial index
#[derive(Debug)]
pub struct SortedRun<V> {
    level: usize,
    timestamp: u64,
    total_mbr: Mbr,
    rtree: RTree<V>,
    record_count: usize,
}

impl<V: Clone> SortedRun<V> {
    /// One-shot build; the run is immutable afterwards.
    ///
    /// `record_count` includes tombstones: they occupy the run until a
    /// merge retires them.
    pub fn build(
        records: Vec<SpatialRecord<V>>,
        level: usize,
        timestamp: u64,
        dimensions: usize,
        fanout: usize,
    ) -> Result<Self> {
        for record in &records {
            if record.point.dimensions() != dimensions {
                return Err(StorageError::DimensionMismatch {
                    expected: dimensions,
                    actual: record.point.dimensions(),
                });
            }
        }
        let record_count = records.len();
        let rtree = RTree::bulk_load(records, dimensions, fanout);
        let total_mbr = rtree.total_mbr();
        Ok(Self {
            level,
            timestamp,
            total_mbr,
            rtree,
            record_count,
        })
    }

    /// Two-stage range search: coarse MBR filter, then R-tree descent.
    /// Tombstones are returned; the engine reconciles visibility.
    pub fn range_search(&self, query: &Mbr) -> Vec<SpatialRecord<V>> {
        if !self.total_mbr.intersects(query) {
            return Vec::new();
        }
        self.rtree.range_search(query)
    }

    /// Every record in the run, for the merge kernel
    pub fn all_records(&self) -> Vec<SpatialRecord<V>> {
        self.rtree.all_records()
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn total_mbr(&self) -> &Mbr {
        &self.total_mbr
    }

    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn p(x: f64, y: f64) -> Point {
        Point::new(vec![x, y])
    }

    fn rec(x: f64, y: f64, value: u64) -> SpatialRecord<u64> {
        SpatialRecord::new(p(x, y), value)
    }

    #[test]
    fn test_build_sets_mbr_and_count() {
        let run = SortedRun::build(
            vec![rec(0.1, 0.2, 1), rec(0.8, 0.9, 2)],
            0,
            1,
            2,
            50,
        )
        .unwrap();
        assert_eq!(run.len(), 2);
        assert_eq!(run.level(), 0);
        assert_eq!(run.timestamp(), 1);
        assert_eq!(run.total_mbr().lower(), &p(0.1, 0.2));
        assert_eq!(run.total_mbr().upper(), &p(0.8, 0.9));
    }

    #[test]
    fn test_mbr_prune_short_circuits() {
        let run = SortedRun::build(vec![rec(0.1, 0.1, 1)], 0, 1, 2, 50).unwrap();
        let far = Mbr::new(p(0.8, 0.8), p(0.9, 0.9)).unwrap();
        assert!(run.range_search(&far).is_empty());
        assert!(!run.total_mbr().intersects(&far));
    }

    #[test]
    fn test_empty_run_has_empty_mbr() {
        let run: SortedRun<u64> = SortedRun::build(Vec::new(), 0, 1, 2, 50).unwrap();
        assert!(run.is_empty());
        assert!(run.total_mbr().is_empty());
        assert!(run.range_search(&Mbr::universe(2)).is_empty());
    }

    #[test]
    fn test_tombstones_counted_and_returned() {
        let records = vec![rec(0.1, 0.1, 1), SpatialRecord::tombstone(p(0.2, 0.2))];
        let run = SortedRun::build(records, 0, 1, 2, 50).unwrap();
        assert_eq!(run.len(), 2);
        let hits = run.range_search(&Mbr::universe(2));
        assert_eq!(hits.iter().filter(|r| r.tombstone).count(), 1);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let bad = vec![SpatialRecord::new(Point::new(vec![0.1]), 1u64)];
        assert!(SortedRun::build(bad, 0, 1, 2, 50).is_err());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = RunClock::new();
        let a = clock.next();
        let b = clock.next();
        assert!(b > a);
    }
}

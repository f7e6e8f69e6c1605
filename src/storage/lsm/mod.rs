//! Spatial LSM-tree storage engine
//!
//! ## Architecture
//! - **Memtable**: mutable in-memory write buffer (point -> record)
//! - **SortedRun**: immutable flushed batch with a local bulk-loaded
//!   R-tree and a total MBR for coarse filtering
//! - **Partitioning**: how a flushed/merged batch is split across runs
//!   (Size / STR / R*-Grove)
//! - **Compaction**: when and what to merge
//!   (Binomial / Tiered / Concurrent / Leveled)
//! - **Engine**: orchestrates insert/flush/merge/query and owns the
//!   metrics that make the three choices above measurable
//!
//! Runs exist in memory for the life of the engine; persistence is out of
//! scope by design.

mod compaction;
mod engine;
mod memtable;
mod metrics;
mod partitioning;
mod sorted_run;

pub use compaction::{merge_runs, MergePolicy};
pub use engine::LsmEngine;
pub use memtable::Memtable;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use partitioning::PartitioningStrategy;
pub use sorted_run::{RunClock, SortedRun};

use crate::index::comparator::nearest_x;
use crate::types::SpatialRecord;

/// Collapse multiple versions of the same point down to the newest one.
///
/// `records` must be ordered newest-source-first (memtable before runs,
/// runs by descending timestamp). The stable sort keeps that order among
/// equal points, so keeping the first of each adjacent epsilon-equal group
/// implements newest-wins. Tombstones are kept; callers decide their fate.
pub(crate) fn latest_versions<V: Clone>(
    mut records: Vec<SpatialRecord<V>>,
) -> Vec<SpatialRecord<V>> {
    records.sort_by(|a, b| nearest_x(&a.point, &b.point));
    let mut out: Vec<SpatialRecord<V>> = Vec::with_capacity(records.len());
    for record in records {
        match out.last() {
            Some(kept) if kept.point.approx_eq(&record.point) => {} // older duplicate
            _ => out.push(record),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn rec(x: f64, y: f64, value: u64) -> SpatialRecord<u64> {
        SpatialRecord::new(Point::new(vec![x, y]), value)
    }

    #[test]
    fn test_latest_versions_keeps_newest() {
        // Newest-first input: value 2 shadows value 1 at the same point
        let records = vec![rec(0.2, 0.2, 2), rec(0.5, 0.5, 9), rec(0.2, 0.2, 1)];
        let collapsed = latest_versions(records);
        assert_eq!(collapsed.len(), 2);
        let at_dup = collapsed
            .iter()
            .find(|r| r.point.approx_eq(&Point::new(vec![0.2, 0.2])))
            .unwrap();
        assert_eq!(at_dup.value, 2);
    }

    #[test]
    fn test_latest_versions_epsilon_duplicates() {
        let records = vec![rec(0.2, 0.2, 7), rec(0.2 + 1e-10, 0.2, 3)];
        let collapsed = latest_versions(records);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].value, 7);
    }

    #[test]
    fn test_latest_versions_keeps_tombstones() {
        let records = vec![
            SpatialRecord::tombstone(Point::new(vec![0.1, 0.1])),
            rec(0.1, 0.1, 5),
        ];
        let collapsed = latest_versions(records);
        assert_eq!(collapsed.len(), 1);
        assert!(collapsed[0].tombstone);
    }
}

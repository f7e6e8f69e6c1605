//! Engine configuration
//!
//! The three orthogonal research knobs (comparator, partitioning, merge
//! policy) plus the structural parameters of buffer and runs. Presets
//! mirror the workload shapes the engine is benchmarked with.

use crate::index::comparator::SpatialComparator;
use crate::index::rtree::DEFAULT_FANOUT;
use crate::storage::lsm::{MergePolicy, PartitioningStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memtable byte budget before a flush is required (default 1 MiB)
    pub memtable_max_bytes: usize,

    /// Per-record payload estimate used by the memtable size accounting
    pub value_bytes: usize,

    /// Maximum records per sorted run
    pub max_component_size: usize,

    /// R-tree node fan-out
    pub rtree_fanout: usize,

    /// Point ordering used by sorts and Size partitioning
    pub comparator: SpatialComparator,

    /// How flushed/merged batches are split across runs
    pub partitioning: PartitioningStrategy,

    /// When and what to compact
    pub merge_policy: MergePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memtable_max_bytes: 1024 * 1024,
            value_bytes: 16,
            max_component_size: 1000,
            rtree_fanout: DEFAULT_FANOUT,
            comparator: SpatialComparator::NearestX,
            partitioning: PartitioningStrategy::Size,
            merge_policy: MergePolicy::Binomial { k: 4 },
        }
    }
}

impl EngineConfig {
    /// Lazy compaction, large buffer: favors ingestion throughput
    pub fn write_optimized() -> Self {
        Self {
            memtable_max_bytes: 4 * 1024 * 1024,
            merge_policy: MergePolicy::Tiered { factor: 10 },
            ..Default::default()
        }
    }

    /// Aggressive leveled compaction with spatially disjoint runs:
    /// favors query latency on clustered data
    pub fn read_optimized() -> Self {
        Self {
            comparator: SpatialComparator::Hilbert,
            partitioning: PartitioningStrategy::Str,
            merge_policy: MergePolicy::Leveled {
                size_ratio: 10,
                base_size: 1000,
            },
            ..Default::default()
        }
    }

    pub fn with_comparator(mut self, comparator: SpatialComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_partitioning(mut self, partitioning: PartitioningStrategy) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn with_memtable_bytes(mut self, bytes: usize) -> Self {
        self.memtable_max_bytes = bytes;
        self
    }

    pub fn with_max_component_size(mut self, records: usize) -> Self {
        self.max_component_size = records;
        self
    }
}

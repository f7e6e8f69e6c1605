//! TerraDB Storage Engine
//!
//! A write-optimized spatial LSM storage engine: an LSM-structured index
//! over multidimensional point records supporting insert, tombstone-based
//! delete, and axis-aligned range queries.
//!
//! ## Architecture
//! - Geometry: multidimensional `Point` + `Mbr` with epsilon equality
//! - Comparators: Nearest-X, Hilbert and Z-order total orders
//! - Index: per-run R-tree bulk-loaded via Sort-Tile-Recursive
//! - Storage: memtable + immutable sorted runs, pluggable partitioning
//!   (Size / STR / R*-Grove) and merge policies (Binomial / Tiered /
//!   Concurrent / Leveled)
//! - Metrics: write/read amplification and query latency, so the three
//!   knobs above can be compared on uniform vs clustered workloads
//!
//! The SQL front end, CLI shell and workload driver are thin consumers of
//! the engine API; nothing about them leaks below `(Point, value)` and
//! `Mbr`.

pub mod catalog;
pub mod config;
pub mod index;
pub mod sql;
pub mod storage;
pub mod types;
pub mod workload;

mod error;

pub use config::EngineConfig;
pub use error::{Result, StorageError};
pub use index::{RTree, SpatialComparator};
pub use storage::lsm::{
    LsmEngine, Memtable, MergePolicy, MetricsSnapshot, PartitioningStrategy, SortedRun,
};
pub use types::{Mbr, Point, SpatialRecord};

//! Spatial indexing: comparators and the per-run R-tree

pub mod comparator;
pub mod rtree;

pub use comparator::{hilbert_index, nearest_x, z_order_index, SpatialComparator, CURVE_ORDER};
pub use rtree::{RTree, DEFAULT_FANOUT};

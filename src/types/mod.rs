//! Core data types

pub mod spatial;

pub use spatial::{Mbr, Point, SpatialRecord};

/// Coordinate equality tolerance, per axis.
pub const EPSILON: f64 = 1e-9;

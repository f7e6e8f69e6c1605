//! Storage layer: the spatial LSM engine

pub mod lsm;

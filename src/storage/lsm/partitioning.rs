//! Partitioning strategies: how a flushed or merged batch becomes runs
//!
//! A strategy maps a record batch to a set of sorted runs, each holding at
//! most `max_component_size` records. The choice decides how much the
//! resulting run MBRs overlap, which directly drives how many runs a
//! query must visit:
//!
//! - **Size**: comparator-sorted contiguous chunks. Fast, but component
//!   MBRs can overlap heavily on clustered data.
//! - **STR**: Sort-Tile-Recursive slicing at the run level; approximately
//!   disjoint components in 2D.
//! - **R*-Grove**: sample / boundary / assign, aiming for square-like
//!   component MBRs.
//!
//! Tombstones are partitioned like live records: a deletion must ride its
//! flush into a run to shadow older copies.

use super::sorted_run::{RunClock, SortedRun};
use crate::error::Result;
use crate::index::comparator::SpatialComparator;
use crate::index::rtree::str_tile;
use crate::types::{Mbr, Point, SpatialRecord};
use serde::{Deserialize, Serialize};

/// Minimum sample size for R*-Grove boundary estimation
const MIN_SAMPLE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PartitioningStrategy {
    /// Comparator-sorted contiguous chunks of `max_component_size`
    Size,
    /// Recursive alternate-axis slicing until chunks fit
    Str,
    /// Sample-based grid/band boundaries, minimum-expansion assignment
    RStarGrove { sample_ratio: f64 },
}

impl Default for PartitioningStrategy {
    fn default() -> Self {
        PartitioningStrategy::Size
    }
}

impl PartitioningStrategy {
    pub fn rstar_grove() -> Self {
        PartitioningStrategy::RStarGrove { sample_ratio: 0.1 }
    }

    /// Split `records` into runs of at most `max_component_size` records,
    /// building each through [`SortedRun::build`] at `target_level`.
    pub fn partition<V: Clone + Default>(
        &self,
        records: Vec<SpatialRecord<V>>,
        target_level: usize,
        dimensions: usize,
        max_component_size: usize,
        comparator: SpatialComparator,
        fanout: usize,
        clock: &RunClock,
    ) -> Result<Vec<SortedRun<V>>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let chunks = match self {
            PartitioningStrategy::Size => {
                size_chunks(records, dimensions, max_component_size, comparator)
            }
            PartitioningStrategy::Str => {
                let mut groups = Vec::new();
                str_tile(
                    records,
                    max_component_size,
                    dimensions,
                    0,
                    &mut |r: &SpatialRecord<V>, axis| r.point.coord(axis),
                    &mut groups,
                );
                groups
            }
            PartitioningStrategy::RStarGrove { sample_ratio } => grove_chunks(
                records,
                dimensions,
                max_component_size,
                comparator,
                *sample_ratio,
            ),
        };

        chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| SortedRun::build(chunk, target_level, clock.next(), dimensions, fanout))
            .collect()
    }
}

/// Sort by the engine comparator, cut into contiguous chunks
fn size_chunks<V: Clone>(
    mut records: Vec<SpatialRecord<V>>,
    dimensions: usize,
    max_component_size: usize,
    comparator: SpatialComparator,
) -> Vec<Vec<SpatialRecord<V>>> {
    let bounds = Mbr::from_points(dimensions, records.iter().map(|r| &r.point));
    records.sort_by(|a, b| comparator.compare(&a.point, &b.point, &bounds));

    let mut chunks = Vec::new();
    let mut rest = records;
    while !rest.is_empty() {
        let tail = rest.split_off(rest.len().min(max_component_size));
        chunks.push(rest);
        rest = tail;
    }
    chunks
}

/// R*-Grove three-phase partitioning: sample, boundary, assign
fn grove_chunks<V: Clone>(
    records: Vec<SpatialRecord<V>>,
    dimensions: usize,
    max_component_size: usize,
    comparator: SpatialComparator,
    sample_ratio: f64,
) -> Vec<Vec<SpatialRecord<V>>> {
    let n = records.len();
    if n <= max_component_size {
        return vec![records];
    }

    // Phase 1: uniform stride sample, clamped to a usable size
    let target = ((n as f64 * sample_ratio).ceil() as usize)
        .max(MIN_SAMPLE.min(n))
        .min(n);
    let stride = (n / target).max(1);
    let sample: Vec<Point> = records
        .iter()
        .step_by(stride)
        .map(|r| r.point.clone())
        .collect();

    // Phase 2: K boundary MBRs from the sample
    let partitions = (n + max_component_size - 1) / max_component_size;
    let boundaries = if dimensions == 2 {
        grid_boundaries(&sample, partitions)
    } else {
        band_boundaries(&sample, dimensions, partitions, comparator)
    };

    // Phase 3: assign each record to the boundary with minimum area
    // expansion, ties broken by index
    let mut bins: Vec<Vec<SpatialRecord<V>>> = (0..boundaries.len()).map(|_| Vec::new()).collect();
    for record in records {
        let mut best = 0;
        let mut best_cost = f64::INFINITY;
        for (i, boundary) in boundaries.iter().enumerate() {
            let cost = boundary.expansion_area(&record.point);
            if cost < best_cost {
                best_cost = cost;
                best = i;
            }
        }
        bins[best].push(record);
    }

    // Skewed assignment can overflow a bin; split those back into
    // comparator-ordered chunks so the size postcondition holds
    let mut chunks = Vec::new();
    for bin in bins {
        if bin.len() <= max_component_size {
            chunks.push(bin);
        } else {
            chunks.extend(size_chunks(bin, dimensions, max_component_size, comparator));
        }
    }
    chunks
}

/// ceil(sqrt(K)) x ceil(sqrt(K)) grid over the sample's total MBR
fn grid_boundaries(sample: &[Point], partitions: usize) -> Vec<Mbr> {
    let bounds = Mbr::from_points(2, sample.iter());
    let grid = (partitions as f64).sqrt().ceil() as usize;
    let width = (bounds.upper().coord(0) - bounds.lower().coord(0)) / grid as f64;
    let height = (bounds.upper().coord(1) - bounds.lower().coord(1)) / grid as f64;

    let mut cells = Vec::with_capacity(grid * grid);
    for gy in 0..grid {
        for gx in 0..grid {
            let lower = Point::new(vec![
                bounds.lower().coord(0) + gx as f64 * width,
                bounds.lower().coord(1) + gy as f64 * height,
            ]);
            let upper = Point::new(vec![
                bounds.lower().coord(0) + (gx + 1) as f64 * width,
                bounds.lower().coord(1) + (gy + 1) as f64 * height,
            ]);
            // Cell corners are ordered by construction
            cells.push(Mbr::new(lower, upper).expect("grid cell bounds"));
        }
    }
    cells
}

/// Comparator-sorted equal-count bands for D != 2
fn band_boundaries(
    sample: &[Point],
    dimensions: usize,
    partitions: usize,
    comparator: SpatialComparator,
) -> Vec<Mbr> {
    let bounds = Mbr::from_points(dimensions, sample.iter());
    let mut sorted: Vec<Point> = sample.to_vec();
    sorted.sort_by(|a, b| comparator.compare(a, b, &bounds));

    let band_size = (sorted.len() + partitions - 1) / partitions.max(1);
    sorted
        .chunks(band_size.max(1))
        .map(|band| Mbr::from_points(dimensions, band.iter()))
        .collect()
}

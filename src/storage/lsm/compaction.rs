//! Merge policies and the shared merge kernel
//!
//! ## Policies
//! - **Binomial(k)**: a level accumulating k runs is collapsed into the
//!   next level
//! - **Tiered(B)**: runs of similar size (within factor B) merge once B
//!   of them pile up
//! - **Concurrent(min)**: continuously folds the two oldest runs together
//! - **Leveled(r, base)**: level L overflowing base * r^L merges into
//!   L+1, pulling in the overlapping L+1 runs
//!
//! All policies share one kernel: collect, sort, keep the newest version
//! of each point, rebuild. Policies only decide *when* and *what*.

use super::sorted_run::{RunClock, SortedRun};
use super::latest_versions;
use crate::error::Result;
use crate::types::{Mbr, SpatialRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Merge the oldest `k` runs of any level that reaches `k` runs
    Binomial { k: usize },
    /// Merge the first size bucket (sizes within `factor`) holding
    /// `factor` runs
    Tiered { factor: usize },
    /// Merge the two oldest runs whenever at least `min_runs` exist
    Concurrent { min_runs: usize },
    /// Merge an overflowing level into the next, RocksDB-style
    Leveled { size_ratio: usize, base_size: usize },
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Binomial { k: 4 }
    }
}

impl MergePolicy {
    /// Consulted after every flush (and after every merge, until false)
    pub fn should_merge<V: Clone>(&self, runs: &[Arc<SortedRun<V>>]) -> bool {
        match self {
            MergePolicy::Binomial { k } => by_level(runs).values().any(|group| group.len() >= *k),
            MergePolicy::Tiered { factor } => {
                size_buckets(runs, *factor).iter().any(|b| b.len() >= *factor)
            }
            MergePolicy::Concurrent { min_runs } => runs.len() >= *min_runs,
            MergePolicy::Leveled {
                size_ratio,
                base_size,
            } => by_level(runs).iter().any(|(level, group)| {
                total_size(group) > base_size * size_ratio.pow(*level as u32)
            }),
        }
    }

    /// Pick the runs to merge; empty means nothing to do
    pub fn select<V: Clone>(&self, runs: &[Arc<SortedRun<V>>]) -> Vec<Arc<SortedRun<V>>> {
        match self {
            MergePolicy::Binomial { k } => {
                let levels = by_level(runs);
                for (_, group) in levels {
                    if group.len() >= *k {
                        let mut group = group;
                        group.sort_by_key(|r| r.timestamp());
                        group.truncate(*k);
                        return group;
                    }
                }
                Vec::new()
            }
            MergePolicy::Tiered { factor } => size_buckets(runs, *factor)
                .into_iter()
                .find(|bucket| bucket.len() >= *factor)
                .unwrap_or_default(),
            MergePolicy::Concurrent { min_runs } => {
                if runs.len() < *min_runs {
                    return Vec::new();
                }
                let mut sorted: Vec<Arc<SortedRun<V>>> = runs.to_vec();
                sorted.sort_by_key(|r| r.timestamp());
                sorted.truncate(2);
                sorted
            }
            MergePolicy::Leveled {
                size_ratio,
                base_size,
            } => {
                let levels = by_level(runs);
                let mut overflowing = None;
                for (level, group) in &levels {
                    if total_size(group) > base_size * size_ratio.pow(*level as u32) {
                        overflowing = Some((*level, group.clone()));
                        break;
                    }
                }
                let (level, group) = match overflowing {
                    Some(found) => found,
                    None => return Vec::new(),
                };

                // Union MBR of the overflowing level picks up the
                // overlapping runs one level down
                let mut union = Mbr::empty(
                    group.first().map(|r| r.total_mbr().dimensions()).unwrap_or(0),
                );
                for run in &group {
                    union.expand_mbr(run.total_mbr());
                }
                let mut selected = group;
                for run in runs {
                    if run.level() == level + 1 && run.total_mbr().intersects(&union) {
                        selected.push(run.clone());
                    }
                }
                selected
            }
        }
    }

    /// Level of the merge output; merges move data down, never up
    pub fn output_level<V: Clone>(&self, selected: &[Arc<SortedRun<V>>]) -> usize {
        let max_level = selected.iter().map(|r| r.level()).max().unwrap_or(0);
        match self {
            MergePolicy::Binomial { .. } | MergePolicy::Tiered { .. } => max_level + 1,
            MergePolicy::Concurrent { .. } => max_level,
            MergePolicy::Leveled { .. } => {
                // All-of-L plus overlap-of-L+1 selections land on L+1;
                // when L+1 runs were pulled in, max_level already is L+1
                let min_level = selected.iter().map(|r| r.level()).min().unwrap_or(0);
                if max_level > min_level {
                    max_level
                } else {
                    max_level + 1
                }
            }
        }
    }
}

fn by_level<V: Clone>(runs: &[Arc<SortedRun<V>>]) -> BTreeMap<usize, Vec<Arc<SortedRun<V>>>> {
    let mut levels: BTreeMap<usize, Vec<Arc<SortedRun<V>>>> = BTreeMap::new();
    for run in runs {
        levels.entry(run.level()).or_default().push(run.clone());
    }
    levels
}

fn total_size<V: Clone>(runs: &[Arc<SortedRun<V>>]) -> usize {
    runs.iter().map(|r| r.len()).sum()
}

/// Group runs into buckets of similar size: ascending by record count, a
/// run joins the current bucket while its size is within `factor` of the
/// bucket's smallest member.
fn size_buckets<V: Clone>(
    runs: &[Arc<SortedRun<V>>],
    factor: usize,
) -> Vec<Vec<Arc<SortedRun<V>>>> {
    let mut sorted: Vec<Arc<SortedRun<V>>> = runs.to_vec();
    sorted.sort_by_key(|r| (r.len(), r.timestamp()));

    let mut buckets: Vec<Vec<Arc<SortedRun<V>>>> = Vec::new();
    for run in sorted {
        match buckets.last_mut() {
            Some(bucket) if run.len() <= bucket[0].len().max(1) * factor => bucket.push(run),
            _ => buckets.push(vec![run]),
        }
    }
    buckets
}

/// Shared merge kernel.
///
/// Collects every record from `selected` (newest run first), sorts by the
/// lexicographic point order, keeps the newest version of each point, and
/// rebuilds a single run at `target_level`. Tombstones are dropped only
/// when `drop_tombstones`: the caller asserts that no older run outside
/// the selection could still hold a live copy they must shadow.
///
/// The kernel never mutates its inputs; on error the caller's run vector
/// is untouched.
pub fn merge_runs<V: Clone + Default>(
    selected: &[Arc<SortedRun<V>>],
    target_level: usize,
    dimensions: usize,
    fanout: usize,
    drop_tombstones: bool,
    clock: &RunClock,
) -> Result<SortedRun<V>> {
    let mut inputs: Vec<Arc<SortedRun<V>>> = selected.to_vec();
    inputs.sort_by_key(|r| std::cmp::Reverse(r.timestamp()));

    let mut records: Vec<SpatialRecord<V>> =
        Vec::with_capacity(inputs.iter().map(|r| r.len()).sum());
    for run in &inputs {
        records.extend(run.all_records());
    }

    let mut merged = latest_versions(records);
    if drop_tombstones {
        merged.retain(|r| !r.tombstone);
    }

    SortedRun::build(merged, target_level, clock.next(), dimensions, fanout)
}

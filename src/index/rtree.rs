//! In-memory R-tree built by Sort-Tile-Recursive bulk-loading
//!
//! ## Design
//! - Built once from a record batch, never mutated afterwards
//! - Arena representation: nodes live in one `Vec`, children are indices.
//!   No per-node heap allocation, traversal is cache-friendly
//! - STR guarantees uniform depth and tight, mostly-disjoint node MBRs
//!
//! One instance lives inside every sorted run; `range_search` is the
//! second stage of the run's two-stage pruning (coarse total-MBR first).

use crate::types::{Mbr, Point, SpatialRecord};

/// Default maximum entries per node
pub const DEFAULT_FANOUT: usize = 50;

#[derive(Debug)]
enum NodeKind<V> {
    Leaf(Vec<SpatialRecord<V>>),
    Internal(Vec<usize>),
}

#[derive(Debug)]
struct Node<V> {
    mbr: Mbr,
    kind: NodeKind<V>,
}

/// Immutable spatial index over a record batch
#[derive(Debug)]
pub struct RTree<V> {
    nodes: Vec<Node<V>>,
    root: Option<usize>,
    dimensions: usize,
    record_count: usize,
}

impl<V: Clone> RTree<V> {
    /// Bulk-load a tree from `records` with the given fan-out.
    ///
    /// Tombstone records are indexed like live ones; visibility is the
    /// engine's concern, not the tree's.
    pub fn bulk_load(records: Vec<SpatialRecord<V>>, dimensions: usize, fanout: usize) -> Self {
        let fanout = fanout.max(2);
        let record_count = records.len();
        let mut tree = Self {
            nodes: Vec::new(),
            root: None,
            dimensions,
            record_count,
        };
        if records.is_empty() {
            return tree;
        }

        // Tile records into leaves, then stack internal levels until a
        // single root remains. Each upper level regroups the level below
        // by STR over MBR centers.
        let mut leaf_groups = Vec::new();
        str_tile(
            records,
            fanout,
            dimensions,
            0,
            &mut |r: &SpatialRecord<V>, axis| r.point.coord(axis),
            &mut leaf_groups,
        );

        let mut level: Vec<usize> = leaf_groups
            .into_iter()
            .map(|group| tree.push_leaf(group))
            .collect();

        while level.len() > 1 {
            let centers: Vec<(Point, usize)> = level
                .iter()
                .map(|&id| (tree.nodes[id].mbr.center(), id))
                .collect();
            let mut groups = Vec::new();
            str_tile(
                centers,
                fanout,
                dimensions,
                0,
                &mut |item: &(Point, usize), axis| item.0.coord(axis),
                &mut groups,
            );
            level = groups
                .into_iter()
                .map(|group| {
                    let children: Vec<usize> = group.into_iter().map(|(_, id)| id).collect();
                    tree.push_internal(children)
                })
                .collect();
        }

        tree.root = level.pop();
        tree
    }

    fn push_leaf(&mut self, records: Vec<SpatialRecord<V>>) -> usize {
        let mbr = Mbr::from_points(self.dimensions, records.iter().map(|r| &r.point));
        self.nodes.push(Node {
            mbr,
            kind: NodeKind::Leaf(records),
        });
        self.nodes.len() - 1
    }

    fn push_internal(&mut self, children: Vec<usize>) -> usize {
        let mut mbr = Mbr::empty(self.dimensions);
        for &child in &children {
            mbr.expand_mbr(&self.nodes[child].mbr);
        }
        self.nodes.push(Node {
            mbr,
            kind: NodeKind::Internal(children),
        });
        self.nodes.len() - 1
    }

    /// Root MBR; empty when the tree holds no records
    pub fn total_mbr(&self) -> Mbr {
        match self.root {
            Some(id) => self.nodes[id].mbr.clone(),
            None => Mbr::empty(self.dimensions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Prune-and-descend range search.
    ///
    /// Returns every record whose point lies inside `query`, tombstones
    /// included. Output order is the arena build order, so it is
    /// deterministic for a fixed tree and query.
    pub fn range_search(&self, query: &Mbr) -> Vec<SpatialRecord<V>> {
        let mut results = Vec::new();
        if let Some(root) = self.root {
            self.search_node(root, query, &mut results);
        }
        results
    }

    fn search_node(&self, id: usize, query: &Mbr, results: &mut Vec<SpatialRecord<V>>) {
        let node = &self.nodes[id];
        if !node.mbr.intersects(query) {
            return;
        }
        match &node.kind {
            NodeKind::Leaf(records) => {
                for record in records {
                    if query.contains(&record.point) {
                        results.push(record.clone());
                    }
                }
            }
            NodeKind::Internal(children) => {
                for &child in children {
                    self.search_node(child, query, results);
                }
            }
        }
    }

    /// Every record in the tree, in arena leaf order. Used by the merge
    /// kernel, which re-sorts anyway.
    pub fn all_records(&self) -> Vec<SpatialRecord<V>> {
        let mut out = Vec::with_capacity(self.record_count);
        for node in &self.nodes {
            if let NodeKind::Leaf(records) = &node.kind {
                out.extend(records.iter().cloned());
            }
        }
        out
    }
}

/// Sort-Tile-Recursive slicing shared by the tree bulk-load and the STR
/// partitioning strategy.
///
/// Splits `items` into groups of at most `max_per_group`, recursively
/// sorting by the current axis (`dim % dimensions`) and cutting into
/// `S = ceil((N / max)^(1/D))` equal slices (at least 2).
pub(crate) fn str_tile<T, F>(
    mut items: Vec<T>,
    max_per_group: usize,
    dimensions: usize,
    dim: usize,
    coord: &mut F,
    out: &mut Vec<Vec<T>>,
) where
    F: FnMut(&T, usize) -> f64,
{
    let n = items.len();
    if n <= max_per_group {
        out.push(items);
        return;
    }

    let slices = ((n as f64 / max_per_group as f64)
        .powf(1.0 / dimensions as f64)
        .ceil() as usize)
        .max(2);

    let axis = dim % dimensions;
    items.sort_by(|a, b| coord(a, axis).total_cmp(&coord(b, axis)));

    let slice_size = (n + slices - 1) / slices;
    let mut rest = items;
    while !rest.is_empty() {
        let tail = rest.split_off(rest.len().min(slice_size));
        str_tile(rest, max_per_group, dimensions, dim + 1, coord, out);
        rest = tail;
    }
}

//! Memtable: in-memory write buffer
//!
//! A sorted map from point to its latest record, bounded by a byte budget.
//! `insert` refuses once the budget is reached; that is the signal for the
//! engine to flush. Deletes always land (tombstones must never be dropped
//! on the floor just because the buffer is full).
//!
//! All operations take one exclusive lock for their whole duration; the
//! engine never holds this lock together with its own.

use crate::index::comparator::nearest_x;
use crate::types::{Mbr, Point, SpatialRecord};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Fixed per-record bookkeeping cost in the size estimate
const RECORD_OVERHEAD: usize = 17;

/// Map key ordering points lexicographically via `total_cmp`.
///
/// Bitwise ordering keeps the key `Eq`-consistent; the epsilon-tolerant
/// point equality only matters during reconciliation.
#[derive(Debug, Clone)]
struct PointKey(Point);

impl PartialEq for PointKey {
    fn eq(&self, other: &Self) -> bool {
        nearest_x(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for PointKey {}

impl PartialOrd for PointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        nearest_x(&self.0, &other.0)
    }
}

struct MemtableInner<V> {
    data: BTreeMap<PointKey, SpatialRecord<V>>,
    current_bytes: usize,
}

/// Mutable write buffer of the LSM engine
pub struct Memtable<V> {
    inner: Mutex<MemtableInner<V>>,
    max_bytes: usize,
    /// Deterministic per-record byte cost, fixed at construction
    record_bytes: usize,
}

impl<V: Clone + Default> Memtable<V> {
    pub fn new(dimensions: usize, max_bytes: usize, value_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(MemtableInner {
                data: BTreeMap::new(),
                current_bytes: 0,
            }),
            max_bytes,
            record_bytes: dimensions * std::mem::size_of::<f64>() + value_bytes + RECORD_OVERHEAD,
        }
    }

    /// Insert a record; `false` means the buffer is full and the caller
    /// must flush before retrying. Overwriting an existing point never
    /// grows the size estimate.
    pub fn insert(&self, record: SpatialRecord<V>) -> bool {
        let mut inner = self.inner.lock();
        let key = PointKey(record.point.clone());
        let is_new = !inner.data.contains_key(&key);
        if is_new && inner.current_bytes + self.record_bytes > self.max_bytes {
            return false;
        }
        inner.data.insert(key, record);
        if is_new {
            inner.current_bytes += self.record_bytes;
        }
        true
    }

    /// Record a deletion. Tombstones overwrite any live record for the
    /// point and always succeed, counting toward the size budget.
    pub fn delete(&self, point: Point) {
        let mut inner = self.inner.lock();
        let key = PointKey(point.clone());
        let is_new = !inner.data.contains_key(&key);
        inner.data.insert(key, SpatialRecord::tombstone(point));
        if is_new {
            inner.current_bytes += self.record_bytes;
        }
    }

    /// Linear scan over entries, emitting live records the query contains
    pub fn range_search(&self, query: &Mbr) -> Vec<SpatialRecord<V>> {
        let inner = self.inner.lock();
        inner
            .data
            .values()
            .filter(|r| !r.tombstone && query.contains(&r.point))
            .cloned()
            .collect()
    }

    /// Like `range_search` but tombstones are emitted too; the engine
    /// needs them to shadow older runs during reconciliation.
    pub fn range_scan_raw(&self, query: &Mbr) -> Vec<SpatialRecord<V>> {
        let inner = self.inner.lock();
        inner
            .data
            .values()
            .filter(|r| query.contains(&r.point))
            .cloned()
            .collect()
    }

    /// Remove and return all records (live and tombstone) in lexicographic
    /// point order. Partitioning strategies rely on this ordering.
    pub fn drain(&self) -> Vec<SpatialRecord<V>> {
        let mut inner = self.inner.lock();
        inner.current_bytes = 0;
        let data = std::mem::take(&mut inner.data);
        data.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.inner.lock().current_bytes
    }

    /// True when the next new point would exceed the byte budget
    pub fn is_full(&self) -> bool {
        self.inner.lock().current_bytes + self.record_bytes > self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mbr;

    fn p(x: f64, y: f64) -> Point {
        Point::new(vec![x, y])
    }

    fn small_memtable() -> Memtable<u64> {
        // Room for exactly 4 records: 4 * (16 + 8 + 17)
        Memtable::new(2, 4 * 41, 8)
    }

    #[test]
    fn test_insert_and_search() {
        let memtable = small_memtable();
        assert!(memtable.insert(SpatialRecord::new(p(0.1, 0.1), 1)));
        assert!(memtable.insert(SpatialRecord::new(p(0.5, 0.5), 2)));

        let query = Mbr::new(p(0.0, 0.0), p(0.3, 0.3)).unwrap();
        let hits = memtable.range_search(&query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, 1);
    }

    #[test]
    fn test_insert_full_signals_flush() {
        let memtable = small_memtable();
        for i in 0..4 {
            assert!(memtable.insert(SpatialRecord::new(p(i as f64, 0.0), i)));
        }
        assert!(memtable.is_full());
        assert!(!memtable.insert(SpatialRecord::new(p(9.0, 9.0), 9)));
        // Overwrite of an existing point still succeeds at capacity
        assert!(memtable.insert(SpatialRecord::new(p(0.0, 0.0), 42)));
        assert_eq!(memtable.len(), 4);
    }

    #[test]
    fn test_delete_overwrites_and_always_lands() {
        let memtable = small_memtable();
        for i in 0..4 {
            memtable.insert(SpatialRecord::new(p(i as f64, 0.0), i));
        }
        // Buffer is full, tombstone for a fresh point still lands
        memtable.delete(p(8.0, 8.0));
        assert_eq!(memtable.len(), 5);

        memtable.delete(p(0.0, 0.0));
        let hits = memtable.range_search(&Mbr::universe(2));
        assert!(hits.iter().all(|r| r.point != p(0.0, 0.0)));
        // Raw scan still sees the tombstone
        let raw = memtable.range_scan_raw(&Mbr::universe(2));
        assert_eq!(raw.iter().filter(|r| r.tombstone).count(), 2);
    }

    #[test]
    fn test_drain_sorted_and_empties() {
        let memtable = small_memtable();
        memtable.insert(SpatialRecord::new(p(0.9, 0.1), 3));
        memtable.insert(SpatialRecord::new(p(0.1, 0.9), 1));
        memtable.insert(SpatialRecord::new(p(0.1, 0.1), 0));

        let drained = memtable.drain();
        assert_eq!(drained.len(), 3);
        assert!(drained
            .windows(2)
            .all(|w| nearest_x(&w[0].point, &w[1].point) != Ordering::Greater));
        assert!(memtable.is_empty());
        assert_eq!(memtable.current_bytes(), 0);
    }

    #[test]
    fn test_overwrite_keeps_single_version() {
        let memtable = small_memtable();
        memtable.insert(SpatialRecord::new(p(0.5, 0.5), 1));
        memtable.insert(SpatialRecord::new(p(0.5, 0.5), 2));
        assert_eq!(memtable.len(), 1);
        let hits = memtable.range_search(&Mbr::universe(2));
        assert_eq!(hits[0].value, 2);
    }
}

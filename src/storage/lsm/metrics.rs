//! Engine metrics: the numbers that make policy choices comparable
//!
//! Write amplification counts every record written by flushes and merges;
//! read amplification counts runs actually visited after the MBR prune.
//! All fields live behind one lock so `reset` is atomic across them.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Records written across flushes and merges
    pub write_amplification: u64,
    /// Runs scanned after MBR pruning, summed over queries
    pub read_amplification: u64,
    pub total_writes: u64,
    pub total_reads: u64,
    pub total_merges: u64,
    /// Running mean query latency in milliseconds
    pub avg_query_latency_ms: f64,
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_write(&self) {
        self.inner.lock().total_writes += 1;
    }

    pub fn record_flush(&self, records_written: usize) {
        self.inner.lock().write_amplification += records_written as u64;
    }

    pub fn record_merge(&self, records_written: usize) {
        let mut inner = self.inner.lock();
        inner.total_merges += 1;
        inner.write_amplification += records_written as u64;
    }

    /// One query: bump reads, add the runs it visited, fold the latency
    /// into the running mean
    pub fn record_query(&self, runs_scanned: usize, latency_ms: f64) {
        let mut inner = self.inner.lock();
        inner.total_reads += 1;
        inner.read_amplification += runs_scanned as u64;
        let reads = inner.total_reads as f64;
        inner.avg_query_latency_ms =
            (inner.avg_query_latency_ms * (reads - 1.0) + latency_ms) / reads;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock()
    }

    pub fn reset(&self) {
        *self.inner.lock() = MetricsSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = EngineMetrics::new();
        metrics.record_write();
        metrics.record_write();
        metrics.record_flush(100);
        metrics.record_merge(80);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_writes, 2);
        assert_eq!(snap.write_amplification, 180);
        assert_eq!(snap.total_merges, 1);
    }

    #[test]
    fn test_latency_running_mean() {
        let metrics = EngineMetrics::new();
        metrics.record_query(1, 2.0);
        metrics.record_query(3, 4.0);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_reads, 2);
        assert_eq!(snap.read_amplification, 4);
        assert!((snap.avg_query_latency_ms - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_everything() {
        let metrics = EngineMetrics::new();
        metrics.record_write();
        metrics.record_query(2, 1.0);
        metrics.reset();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_writes, 0);
        assert_eq!(snap.total_reads, 0);
        assert_eq!(snap.read_amplification, 0);
        assert_eq!(snap.avg_query_latency_ms, 0.0);
    }
}

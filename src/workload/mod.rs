//! Synthetic workloads and the benchmark driver
//!
//! Datasets mirror the two distributions the engine is evaluated on:
//! uniform random points and clustered points (Gaussian blobs around
//! uniform cluster centers, the OpenStreetMap stand-in). The runner
//! ingests a dataset under a named configuration, replays a query set,
//! and reports the engine metrics per configuration.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::comparator::SpatialComparator;
use crate::storage::lsm::{LsmEngine, MergePolicy, MetricsSnapshot, PartitioningStrategy};
use crate::types::{Mbr, Point};
use rand::prelude::*;
use rand_distr::Normal;
use std::fmt::Write as _;
use std::time::Instant;

/// Seeded generator for reproducible datasets and query sets
pub struct DatasetGenerator {
    rng: StdRng,
}

impl DatasetGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform random points in the unit square
    pub fn uniform(&mut self, count: usize) -> Vec<(Point, u64)> {
        (0..count)
            .map(|i| {
                let p = Point::new(vec![
                    self.rng.gen_range(0.0..1.0),
                    self.rng.gen_range(0.0..1.0),
                ]);
                (p, i as u64)
            })
            .collect()
    }

    /// Gaussian blobs around uniform cluster centers, clamped to the
    /// unit square
    pub fn clustered(&mut self, count: usize, clusters: usize, radius: f64) -> Vec<(Point, u64)> {
        let centers: Vec<(f64, f64)> = (0..clusters.max(1))
            .map(|_| (self.rng.gen_range(0.0..1.0), self.rng.gen_range(0.0..1.0)))
            .collect();
        let spread = Normal::new(0.0, radius).unwrap_or_else(|_| Normal::new(0.0, 0.05).unwrap());

        (0..count)
            .map(|i| {
                let (cx, cy) = centers[self.rng.gen_range(0..centers.len())];
                let x = (cx + spread.sample(&mut self.rng)).clamp(0.0, 1.0);
                let y = (cy + spread.sample(&mut self.rng)).clamp(0.0, 1.0);
                (Point::new(vec![x, y]), i as u64)
            })
            .collect()
    }

    /// Square query box covering `selectivity` of the unit square
    pub fn query_box(&mut self, selectivity: f64) -> Mbr {
        let side = selectivity.sqrt().clamp(0.0, 1.0);
        let x = self.rng.gen_range(0.0..=(1.0 - side));
        let y = self.rng.gen_range(0.0..=(1.0 - side));
        // Corners are ordered by construction
        Mbr::new(
            Point::new(vec![x, y]),
            Point::new(vec![x + side, y + side]),
        )
        .expect("query box bounds")
    }

    pub fn query_set(&mut self, count: usize, selectivity: f64) -> Vec<Mbr> {
        (0..count).map(|_| self.query_box(selectivity)).collect()
    }
}

/// One engine configuration under test
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub name: String,
    pub comparator: SpatialComparator,
    pub partitioning: PartitioningStrategy,
    pub merge_policy: MergePolicy,
}

impl BenchmarkConfig {
    pub fn new(
        name: &str,
        comparator: SpatialComparator,
        partitioning: PartitioningStrategy,
        merge_policy: MergePolicy,
    ) -> Self {
        Self {
            name: name.to_string(),
            comparator,
            partitioning,
            merge_policy,
        }
    }
}

/// The configurations compared in the standard evaluation matrix
pub fn standard_configs() -> Vec<BenchmarkConfig> {
    vec![
        BenchmarkConfig::new(
            "Binomial k=4 / NearestX / Size",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Binomial { k: 4 },
        ),
        BenchmarkConfig::new(
            "Binomial k=10 / NearestX / Size",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Binomial { k: 10 },
        ),
        BenchmarkConfig::new(
            "Binomial k=4 / Hilbert / Size",
            SpatialComparator::Hilbert,
            PartitioningStrategy::Size,
            MergePolicy::Binomial { k: 4 },
        ),
        BenchmarkConfig::new(
            "Tiered B=4 / NearestX / Size",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Tiered { factor: 4 },
        ),
        BenchmarkConfig::new(
            "Tiered B=10 / NearestX / Size",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Tiered { factor: 10 },
        ),
        BenchmarkConfig::new(
            "Leveled / NearestX / STR",
            SpatialComparator::NearestX,
            PartitioningStrategy::Str,
            MergePolicy::Leveled {
                size_ratio: 10,
                base_size: 1000,
            },
        ),
        BenchmarkConfig::new(
            "Leveled / Hilbert / STR",
            SpatialComparator::Hilbert,
            PartitioningStrategy::Str,
            MergePolicy::Leveled {
                size_ratio: 10,
                base_size: 1000,
            },
        ),
        BenchmarkConfig::new(
            "Leveled / NearestX / R*-Grove",
            SpatialComparator::NearestX,
            PartitioningStrategy::rstar_grove(),
            MergePolicy::Leveled {
                size_ratio: 10,
                base_size: 1000,
            },
        ),
        BenchmarkConfig::new(
            "Concurrent / NearestX / Size",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Concurrent { min_runs: 2 },
        ),
    ]
}

/// Measured outcome of one configuration
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub name: String,
    pub ingest_ms: f64,
    pub query_ms: f64,
    pub components: usize,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Default)]
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self
    }

    /// Ingest the dataset, flush, replay the query set, collect metrics
    pub fn run(
        &self,
        config: &BenchmarkConfig,
        dataset: &[(Point, u64)],
        queries: &[Mbr],
    ) -> Result<BenchmarkReport> {
        let engine_config = EngineConfig::default()
            .with_comparator(config.comparator)
            .with_partitioning(config.partitioning)
            .with_merge_policy(config.merge_policy);
        let engine: LsmEngine<u64> = LsmEngine::with_config(2, engine_config)?;

        let ingest_start = Instant::now();
        for (point, value) in dataset {
            engine.insert(point.clone(), *value)?;
        }
        engine.flush()?;
        let ingest_ms = ingest_start.elapsed().as_secs_f64() * 1000.0;

        let query_start = Instant::now();
        for query in queries {
            engine.range_query(query)?;
        }
        let query_ms = query_start.elapsed().as_secs_f64() * 1000.0;

        Ok(BenchmarkReport {
            name: config.name.clone(),
            ingest_ms,
            query_ms,
            components: engine.component_count(),
            metrics: engine.metrics(),
        })
    }

    pub fn run_comparison(
        &self,
        configs: &[BenchmarkConfig],
        dataset: &[(Point, u64)],
        queries: &[Mbr],
    ) -> Result<Vec<BenchmarkReport>> {
        configs
            .iter()
            .map(|config| self.run(config, dataset, queries))
            .collect()
    }
}

/// Fixed-width comparison table for the CLI
pub fn format_results(reports: &[BenchmarkReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<34} {:>8} {:>8} {:>7} {:>6} {:>10} {:>10}",
        "configuration", "WA", "RA", "merges", "runs", "ingest ms", "query ms"
    );
    let _ = writeln!(out, "{}", "-".repeat(88));
    for report in reports {
        let _ = writeln!(
            out,
            "{:<34} {:>8} {:>8} {:>7} {:>6} {:>10.1} {:>10.1}",
            report.name,
            report.metrics.write_amplification,
            report.metrics.read_amplification,
            report.metrics.total_merges,
            report.components,
            report.ingest_ms,
            report.query_ms,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_dataset() {
        let mut gen = DatasetGenerator::new(42);
        let dataset = gen.uniform(1000);
        assert_eq!(dataset.len(), 1000);
        assert!(dataset.iter().all(|(p, _)| {
            (0.0..1.0).contains(&p.coord(0)) && (0.0..1.0).contains(&p.coord(1))
        }));
    }

    #[test]
    fn test_clustered_dataset_clamped() {
        let mut gen = DatasetGenerator::new(42);
        let dataset = gen.clustered(1000, 10, 0.05);
        assert_eq!(dataset.len(), 1000);
        assert!(dataset.iter().all(|(p, _)| {
            (0.0..=1.0).contains(&p.coord(0)) && (0.0..=1.0).contains(&p.coord(1))
        }));
    }

    #[test]
    fn test_reproducible_with_seed() {
        let a = DatasetGenerator::new(7).uniform(50);
        let b = DatasetGenerator::new(7).uniform(50);
        for ((pa, _), (pb, _)) in a.iter().zip(b.iter()) {
            assert!(pa.approx_eq(pb));
        }
    }

    #[test]
    fn test_query_box_selectivity() {
        let mut gen = DatasetGenerator::new(3);
        let query = gen.query_box(1e-2);
        let side = query.upper().coord(0) - query.lower().coord(0);
        assert!((side - 0.1).abs() < 1e-9);
        assert!(query.is_valid());
    }

    #[test]
    fn test_runner_smoke() {
        let mut gen = DatasetGenerator::new(11);
        let dataset = gen.uniform(2000);
        let queries = gen.query_set(5, 1e-3);

        let config = BenchmarkConfig::new(
            "smoke",
            SpatialComparator::NearestX,
            PartitioningStrategy::Size,
            MergePolicy::Binomial { k: 4 },
        );
        let report = BenchmarkRunner::new().run(&config, &dataset, &queries).unwrap();

        assert_eq!(report.metrics.total_writes, 2000);
        assert_eq!(report.metrics.total_reads, 5);
        assert!(report.metrics.write_amplification >= 2000);
        assert!(report.components > 0);

        let table = format_results(&[report]);
        assert!(table.contains("smoke"));
    }
}

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::warn;

pub mod insert;
pub mod lookup;
pub mod search;

#[cfg(test)]
pub(crate) mod fake;

pub use search::search_combinations;

use crate::client::{InsertedRecord, StoreClient, VectorId};
use crate::config::{BenchConfig, Scenario};
use crate::metrics::{LatencySummary, OperationKind, Sample, ScenarioResult};
use crate::workload::{benchmark_tags, vector_name, VectorGenerator, WorkloadConfig};

/// Value label of the per-call POST series.
pub const INSERT_LABEL: &str = "elapsed_ms";

/// Value label of the per-stage GET mean.
pub const LOOKUP_LABEL: &str = "mean_ms";

/// What a scenario hands back to the reporter.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: ScenarioResult,
    pub latency: Option<LatencySummary>,
}

/// Inserts issued for one stage, in call order.
#[derive(Debug, Clone, Default)]
pub struct StageInserts {
    pub records: Vec<InsertedRecord>,
    pub samples: Vec<Sample>,
}

impl StageInserts {
    pub fn ids(&self) -> Vec<VectorId> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn failures(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_success()).count()
    }
}

/// Benchmark runner drives scenario execution against one store.
///
/// Calls are strictly sequential: every stage's inserts complete before the
/// stage's measurements start, and before the next stage begins.
pub struct BenchmarkRunner<'a, C: StoreClient + ?Sized, R: Rng = StdRng> {
    client: &'a C,
    config: &'a BenchConfig,
    generator: VectorGenerator<R>,
    sampler: R,
    tags: Vec<String>,
    inserted: usize,
    seen_ids: HashSet<VectorId>,
}

impl<'a, C: StoreClient + ?Sized> BenchmarkRunner<'a, C, StdRng> {
    /// Seeds from `config.seed` when set, otherwise from entropy.
    pub fn new(client: &'a C, config: &'a BenchConfig) -> Result<Self> {
        let (gen_rng, sample_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        Self::with_rngs(client, config, gen_rng, sample_rng)
    }
}

impl<'a, C: StoreClient + ?Sized, R: Rng> BenchmarkRunner<'a, C, R> {
    pub fn with_rngs(
        client: &'a C,
        config: &'a BenchConfig,
        gen_rng: R,
        sample_rng: R,
    ) -> Result<Self> {
        let workload = WorkloadConfig::new(config.vector_dim, config.value_low, config.value_high)?;
        Ok(Self {
            client,
            config,
            generator: VectorGenerator::with_rng(workload, gen_rng),
            sampler: sample_rng,
            tags: benchmark_tags(),
            inserted: 0,
            seen_ids: HashSet::new(),
        })
    }

    /// Run the selected scenario across its full sweep.
    pub async fn run(&mut self, scenario: Scenario) -> Result<RunReport> {
        match scenario {
            Scenario::Insert => self.run_insert().await,
            Scenario::Lookup => Ok(RunReport {
                results: self.run_lookup().await?,
                latency: None,
            }),
            Scenario::Search => Ok(RunReport {
                results: self.run_search().await?,
                latency: None,
            }),
        }
    }

    /// Insert `count` freshly generated vectors one after another.
    ///
    /// Samples stay index-correlated with insertion order. A store id seen
    /// earlier in the run is recorded as a failed insert, since the record
    /// cannot be told apart from the earlier one.
    pub async fn insert_vectors(&mut self, count: usize) -> StageInserts {
        let pb = self.progress_bar(count as u64);
        let mut out = StageInserts {
            records: Vec::with_capacity(count),
            samples: Vec::with_capacity(count),
        };

        for _ in 0..count {
            let vector = self.generator.generate();
            let name = vector_name(self.inserted);
            self.inserted += 1;

            let timed = self.client.insert(&vector, &name, &self.tags).await;
            let mut sample = timed.sample;
            if let Some(record) = timed.value {
                if self.seen_ids.insert(record.id.clone()) {
                    out.records.push(record);
                } else {
                    warn!(id = %record.id, name = %name, "store returned a duplicate id");
                    sample = Sample::failure(
                        OperationKind::Insert,
                        std::time::Duration::ZERO,
                        None,
                        format!("duplicate id {}", record.id),
                    );
                }
            }
            out.samples.push(sample);
            pb.inc(1);
        }

        pb.finish_and_clear();
        out
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} inserts",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

use anyhow::Result;
use rand::Rng;
use tracing::info;

use super::{BenchmarkRunner, RunReport, INSERT_LABEL};
use crate::client::StoreClient;
use crate::metrics::{Aggregator, MetricsCollector, StageResult};

impl<'a, C: StoreClient + ?Sized, R: Rng> BenchmarkRunner<'a, C, R> {
    /// POST scenario: `post_vector_count` back-to-back inserts.
    ///
    /// Each call is its own stage keyed by its 1-based position, so the
    /// result traces latency drift as the store grows.
    pub async fn run_insert(&mut self) -> Result<RunReport> {
        let count = self.config.post_vector_count;
        info!(count, "benchmarking POST /vectors");

        let inserts = self.insert_vectors(count).await;

        let mut collector = MetricsCollector::new()?;
        let mut aggregator = Aggregator::new();
        for (i, sample) in inserts.samples.iter().enumerate() {
            collector.record(sample);

            let mut stage = StageResult {
                attempts: 1,
                failures: usize::from(!sample.is_success()),
                ..StageResult::default()
            };
            stage
                .values
                .insert(INSERT_LABEL.to_string(), sample.elapsed_ms());
            aggregator.collect(i as u64 + 1, stage)?;
        }

        info!(
            ok = inserts.records.len(),
            failed = inserts.failures(),
            "POST benchmark complete"
        );

        Ok(RunReport {
            results: aggregator.finish(),
            latency: collector.summary(),
        })
    }
}

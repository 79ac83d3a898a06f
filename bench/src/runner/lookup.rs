use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use super::{BenchmarkRunner, LOOKUP_LABEL};
use crate::client::StoreClient;
use crate::metrics::{mean_elapsed_ms, Aggregator, ScenarioResult, StageResult};
use crate::workload::{sample_with_replacement, Stage, Sweep};

impl<'a, C: StoreClient + ?Sized, R: Rng> BenchmarkRunner<'a, C, R> {
    /// GET scenario across the configured sweep.
    pub async fn run_lookup(&mut self) -> Result<ScenarioResult> {
        let sweep = Sweep::from_counts(&self.config.ranges_get_search)?;
        let mut aggregator = Aggregator::new();

        for stage in sweep.stages() {
            let result = self.lookup_stage(stage).await;
            aggregator.collect(stage.cumulative, result)?;
        }

        Ok(aggregator.finish())
    }

    /// Insert the stage's vectors, then time `num_queries_get` lookups of ids
    /// drawn with replacement from this stage's inserts.
    pub async fn lookup_stage(&mut self, stage: &Stage) -> StageResult {
        info!(
            stage = stage.index,
            inserting = stage.count,
            cumulative = stage.cumulative,
            "benchmarking GET /vectors/<id>"
        );

        let inserts = self.insert_vectors(stage.count).await;
        let ids = inserts.ids();
        let drawn = sample_with_replacement(&ids, self.config.num_queries_get, &mut self.sampler);

        let mut samples = Vec::with_capacity(drawn.len());
        for id in &drawn {
            samples.push(self.client.get(id).await.sample);
        }

        let mean = mean_elapsed_ms(&samples);
        let failures = samples.iter().filter(|s| !s.is_success()).count();
        match mean {
            Some(ms) => info!(
                cumulative = stage.cumulative,
                mean_ms = ms,
                queries = samples.len(),
                failures,
                "lookup stage complete"
            ),
            None => warn!(
                cumulative = stage.cumulative,
                queries = samples.len(),
                inserted = ids.len(),
                "no successful lookups in stage"
            ),
        }

        let mut result = StageResult {
            attempts: samples.len(),
            failures,
            insert_failures: inserts.failures(),
            ..StageResult::default()
        };
        result.values.insert(LOOKUP_LABEL.to_string(), mean);
        result
    }
}

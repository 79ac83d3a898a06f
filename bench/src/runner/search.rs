use anyhow::Result;
use rand::Rng;
use tracing::info;

use super::BenchmarkRunner;
use crate::client::{DistanceFn, DistanceMethod, SearchRequest, SearchType, StoreClient};
use crate::metrics::{Aggregator, ScenarioResult, StageResult};
use crate::workload::{Stage, Sweep};

/// Search/distance pairs issued per stage: scalar only, or scalar and SIMD.
pub fn search_combinations(
    use_simd: bool,
    function: DistanceFn,
) -> Vec<(SearchType, DistanceMethod)> {
    let mut methods = vec![DistanceMethod::scalar(function)];
    if use_simd {
        methods.push(DistanceMethod::simd(function));
    }

    methods
        .iter()
        .flat_map(|&method| SearchType::ALL.iter().map(move |&st| (st, method)))
        .collect()
}

/// Result label of one combination, e.g. `approximate/simd`.
pub fn combination_label(search_type: SearchType, method: DistanceMethod) -> String {
    format!("{}/{}", search_type.as_str(), method.label())
}

impl<'a, C: StoreClient + ?Sized, R: Rng> BenchmarkRunner<'a, C, R> {
    /// SEARCH scenario across the configured sweep.
    pub async fn run_search(&mut self) -> Result<ScenarioResult> {
        let sweep = Sweep::from_counts(&self.config.ranges_get_search)?;
        let mut aggregator = Aggregator::new();

        for stage in sweep.stages() {
            let result = self.search_stage(stage).await;
            aggregator.collect(stage.cumulative, result)?;
        }

        Ok(aggregator.finish())
    }

    /// Insert the stage's vectors, then issue one search per combination
    /// with a single fresh query vector.
    pub async fn search_stage(&mut self, stage: &Stage) -> StageResult {
        info!(
            stage = stage.index,
            inserting = stage.count,
            cumulative = stage.cumulative,
            "benchmarking POST /search"
        );

        let inserts = self.insert_vectors(stage.count).await;
        let query = self.generator.generate();

        let combinations = search_combinations(self.config.use_simd, self.config.distance_fn);
        let mut result = StageResult {
            attempts: combinations.len(),
            insert_failures: inserts.failures(),
            ..StageResult::default()
        };

        for (search_type, distance_method) in combinations {
            let request = SearchRequest {
                query: query.clone(),
                top_k: self.config.top_k,
                ef_search: self.config.ef_search,
                search_type,
                distance_method,
            };
            let sample = self.client.search(&request).await.sample;
            let label = combination_label(search_type, distance_method);

            match sample.elapsed_ms() {
                Some(ms) => info!(cumulative = stage.cumulative, %label, elapsed_ms = ms, "search"),
                None => result.failures += 1,
            }
            result.values.insert(label, sample.elapsed_ms());
        }

        result
    }
}

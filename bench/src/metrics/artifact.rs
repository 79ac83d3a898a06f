//! Persisted shape of a benchmark run.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{LatencySummary, ScenarioResult};
use crate::config::{BenchConfig, Scenario};

/// Configuration fields recorded with every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub base_url: String,
    pub vector_dim: usize,
    pub post_vector_count: usize,
    pub num_queries_get: usize,
    pub ranges_get_search: Vec<usize>,
    pub quantized: bool,
    pub use_simd: bool,
    pub figs_folder: PathBuf,
    pub distance_fn: String,
}

impl From<&BenchConfig> for ConfigSnapshot {
    fn from(config: &BenchConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            vector_dim: config.vector_dim,
            post_vector_count: config.post_vector_count,
            num_queries_get: config.num_queries_get,
            ranges_get_search: config.ranges_get_search.clone(),
            quantized: config.quantized,
            use_simd: config.use_simd,
            figs_folder: config.figs_folder.clone(),
            distance_fn: config.distance_fn.as_str().to_string(),
        }
    }
}

/// Unit written to the artifact store once per execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    #[serde(flatten)]
    pub config: ConfigSnapshot,
    pub datetime: DateTime<Local>,
    pub method: Scenario,
    pub results: ScenarioResult,
    /// Failed calls across all stages, inserts included
    pub failures: usize,
    /// Per-call distribution; recorded for the POST scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
}

impl BenchmarkRun {
    pub fn new(
        config: &BenchConfig,
        method: Scenario,
        started: DateTime<Local>,
        results: ScenarioResult,
        latency: Option<LatencySummary>,
    ) -> Self {
        Self {
            config: ConfigSnapshot::from(config),
            datetime: started,
            method,
            failures: results.total_failures(),
            results,
            latency,
        }
    }

    /// Timestamp-qualified file stem, e.g. `benchmark_GET_20250101_120000_123`.
    pub fn file_stem(&self) -> String {
        format!(
            "benchmark_{}_{}",
            self.method.as_str(),
            self.datetime.format("%Y%m%d_%H%M%S_%3f")
        )
    }
}

use anyhow::Result;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub mod artifact;
pub mod chart;
pub mod reporter;

pub use artifact::{BenchmarkRun, ConfigSnapshot};
pub use reporter::ResultsReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Get,
    Search,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Insert => "insert",
            OperationKind::Get => "get",
            OperationKind::Search => "search",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "result")]
pub enum Outcome {
    Success,
    Failure {
        status: Option<u16>,
        message: String,
    },
}

/// One timed store call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub kind: OperationKind,
    elapsed_ms: f64,
    pub outcome: Outcome,
}

impl Sample {
    pub fn success(kind: OperationKind, elapsed: Duration) -> Self {
        Self {
            kind,
            elapsed_ms: elapsed.as_nanos() as f64 / 1_000_000.0,
            outcome: Outcome::Success,
        }
    }

    pub fn failure(
        kind: OperationKind,
        elapsed: Duration,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            elapsed_ms: elapsed.as_nanos() as f64 / 1_000_000.0,
            outcome: Outcome::Failure {
                status,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// Elapsed time, only for successful calls.
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.is_success().then_some(self.elapsed_ms)
    }
}

/// Arithmetic mean over the successful samples, `None` when there are none.
pub fn mean_elapsed_ms(samples: &[Sample]) -> Option<f64> {
    let successful: Vec<f64> = samples.iter().filter_map(Sample::elapsed_ms).collect();
    if successful.is_empty() {
        return None;
    }
    Some(successful.iter().sum::<f64>() / successful.len() as f64)
}

/// Measurements recorded for one sweep key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Named timing values in milliseconds; `None` marks an empty aggregate.
    pub values: BTreeMap<String, Option<f64>>,
    /// Measured calls attempted
    pub attempts: usize,
    /// Measured calls that failed
    pub failures: usize,
    /// Inserts of this stage that failed
    pub insert_failures: usize,
}

impl StageResult {
    pub fn value(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied().flatten()
    }
}

/// Stage results ordered by cumulative inserted-vector count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioResult {
    stages: BTreeMap<u64, StageResult>,
}

impl ScenarioResult {
    pub fn stages(&self) -> &BTreeMap<u64, StageResult> {
        &self.stages
    }

    pub fn keys(&self) -> Vec<u64> {
        self.stages.keys().copied().collect()
    }

    pub fn get(&self, key: u64) -> Option<&StageResult> {
        self.stages.get(&key)
    }

    /// Every label that appears in any stage, sorted.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .stages
            .values()
            .flat_map(|s| s.values.keys().cloned())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    /// `(key, value)` points of one label, skipping empty aggregates.
    pub fn series(&self, label: &str) -> Vec<(u64, f64)> {
        self.stages
            .iter()
            .filter_map(|(k, s)| s.value(label).map(|v| (*k, v)))
            .collect()
    }

    pub fn total_failures(&self) -> usize {
        self.stages
            .values()
            .map(|s| s.failures + s.insert_failures)
            .sum()
    }
}

/// Run-scoped accumulator of stage results.
#[derive(Debug, Default)]
pub struct Aggregator {
    result: ScenarioResult,
    last_key: Option<u64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one stage. Keys must strictly increase.
    pub fn collect(&mut self, key: u64, stage: StageResult) -> Result<()> {
        if let Some(last) = self.last_key {
            anyhow::ensure!(
                key > last,
                "sweep key {} does not follow previous key {}",
                key,
                last
            );
        }
        self.last_key = Some(key);
        self.result.stages.insert(key, stage);
        Ok(())
    }

    pub fn finish(self) -> ScenarioResult {
        self.result
    }
}

/// Latency distribution over successful calls, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: u64,
    pub failed: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

/// Histogram-backed collector, resolution 1 µs.
pub struct MetricsCollector {
    histogram: Histogram<u64>,
    successful_ops: u64,
    failed_ops: u64,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            histogram: Histogram::new(3)?,
            successful_ops: 0,
            failed_ops: 0,
        })
    }

    pub fn record(&mut self, sample: &Sample) {
        match sample.elapsed_ms() {
            Some(ms) => {
                let _ = self.histogram.record((ms * 1000.0).round() as u64);
                self.successful_ops += 1;
            }
            None => self.failed_ops += 1,
        }
    }

    /// `None` when no call succeeded.
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.successful_ops == 0 {
            return None;
        }
        let ms = |us: u64| us as f64 / 1000.0;
        Some(LatencySummary {
            count: self.successful_ops,
            failed: self.failed_ops,
            min_ms: ms(self.histogram.min()),
            mean_ms: self.histogram.mean() / 1000.0,
            p50_ms: ms(self.histogram.value_at_quantile(0.50)),
            p95_ms: ms(self.histogram.value_at_quantile(0.95)),
            p99_ms: ms(self.histogram.value_at_quantile(0.99)),
            max_ms: ms(self.histogram.max()),
        })
    }
}

use anyhow::Result;
use serde::Serialize;

pub mod generator;
pub mod sweep;

pub use generator::{round_to_precision, sample_with_replacement, VectorGenerator, PRECISION};
pub use sweep::{Stage, Sweep};

/// Fixed-length vector of generated components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Vector(Vec<f32>);

impl Vector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

/// Shape of the synthetic vectors of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadConfig {
    pub dim: usize,
    pub low: f32,
    pub high: f32,
}

impl WorkloadConfig {
    pub fn new(dim: usize, low: f32, high: f32) -> Result<Self> {
        anyhow::ensure!(dim > 0, "vector dimension must be > 0");
        anyhow::ensure!(
            low.is_finite() && high.is_finite() && low <= high,
            "invalid value range [{}, {}]",
            low,
            high
        );
        Ok(Self { dim, low, high })
    }
}

/// Tags attached to every inserted vector.
pub fn benchmark_tags() -> Vec<String> {
    vec!["benchmark".to_string()]
}

/// Name of the `n`-th vector inserted during a run.
pub fn vector_name(n: usize) -> String {
    format!("Vec_{n}")
}

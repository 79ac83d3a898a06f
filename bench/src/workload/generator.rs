use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Vector, WorkloadConfig};

/// Decimal places kept on every generated component.
pub const PRECISION: i32 = 4;

/// Round to [`PRECISION`] decimal places.
pub fn round_to_precision(value: f32) -> f32 {
    let scale = 10f64.powi(PRECISION);
    ((value as f64 * scale).round() / scale) as f32
}

/// Vector generator for benchmarks
pub struct VectorGenerator<R = StdRng> {
    rng: R,
    config: WorkloadConfig,
}

impl VectorGenerator<StdRng> {
    pub fn seeded(config: WorkloadConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(config: WorkloadConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> VectorGenerator<R> {
    pub fn with_rng(config: WorkloadConfig, rng: R) -> Self {
        Self { rng, config }
    }

    /// Draw one vector; every component is uniform over `[low, high]`.
    pub fn generate(&mut self) -> Vector {
        let WorkloadConfig { dim, low, high } = self.config;
        let values = (0..dim)
            .map(|_| {
                let v = self.rng.gen_range(low..=high);
                // rounding can nudge a value just past a bound
                round_to_precision(v).clamp(low, high)
            })
            .collect();
        Vector::new(values)
    }
}

/// Draw `k` ids uniformly with replacement. An empty pool yields nothing.
pub fn sample_with_replacement<T: Clone, R: Rng + ?Sized>(
    pool: &[T],
    k: usize,
    rng: &mut R,
) -> Vec<T> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..k)
        .map(|_| pool[rng.gen_range(0..pool.len())].clone())
        .collect()
}

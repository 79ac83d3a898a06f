//! VFS Benchmark Library
//!
//! Latency benchmarks for a running VFS vector store, driven through its
//! HTTP API:
//! - POST: per-call insert latency
//! - GET: mean point-lookup latency as the dataset grows
//! - SEARCH: exact vs approximate search, scalar vs SIMD distance
//!
//! # Architecture
//!
//! ```text
//! bench
//! ├── client/       # StoreClient trait and the HTTP implementation
//! ├── workload/     # Vector generation, id sampling, size sweeps
//! ├── runner/       # Scenario drivers
//! └── metrics/      # Samples, aggregation, artifacts, charts
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use vfs_bench::{run, BenchConfig, Scenario};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BenchConfig::default();
//!     let outcome = run(&config, Scenario::Lookup).await?;
//!     println!("artifact: {}", outcome.artifact.display());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod runner;
pub mod workload;

pub use client::{ClientConfig, HttpClient, InitRequest, StoreClient};
pub use config::{BenchConfig, Scenario, Variant};
pub use error::HarnessError;
pub use metrics::{BenchmarkRun, ResultsReporter, ScenarioResult};
pub use runner::{BenchmarkRunner, RunReport};

/// Where a finished run ended up.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run: BenchmarkRun,
    pub artifact: PathBuf,
    /// `None` when chart rendering failed
    pub chart: Option<PathBuf>,
}

/// Run one scenario against the store at `config.base_url`.
pub async fn run(config: &BenchConfig, scenario: Scenario) -> Result<RunOutcome> {
    config.validate()?;
    let client = HttpClient::new(ClientConfig {
        base_url: config.base_url.clone(),
        timeout: config.request_timeout(),
    })?;
    run_with_client(&client, config, scenario).await
}

/// Run one scenario with any [`StoreClient`].
///
/// Initialization failure aborts before anything is written. The artifact is
/// persisted before charting, and a charting failure only logs a warning.
pub async fn run_with_client<C: StoreClient + ?Sized>(
    client: &C,
    config: &BenchConfig,
    scenario: Scenario,
) -> Result<RunOutcome> {
    config.validate()?;
    let started = Local::now();

    let init = InitRequest {
        vector_dimension: config.vector_dim,
        storage_name: config.storage_name.clone(),
        truncate_data: config.truncate_data,
        quantize: config.quantized,
    };
    let ack = client
        .init(&init)
        .await
        .context("Store initialization failed")?;
    info!(%ack, dim = init.vector_dimension, quantize = init.quantize, "store initialized");

    let mut runner = BenchmarkRunner::new(client, config)?;
    let report = runner.run(scenario).await?;

    let run = BenchmarkRun::new(config, scenario, started, report.results, report.latency);
    let artifact = ResultsReporter::persist(&run, &config.logs_folder)?;

    let chart = match metrics::chart::render(scenario, &run.results, &config.figs_folder) {
        Ok(path) => {
            info!(path = %path.display(), "chart rendered");
            Some(path)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "chart rendering failed; artifact kept");
            None
        }
    };

    Ok(RunOutcome {
        run,
        artifact,
        chart,
    })
}

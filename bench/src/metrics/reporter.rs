use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::BenchmarkRun;
use crate::error::HarnessError;

/// Persists runs and prints their summaries.
pub struct ResultsReporter;

impl ResultsReporter {
    /// Write `run` as JSON under `dir` and return the artifact path.
    ///
    /// The file is opened with `create_new`, so an existing artifact is never
    /// replaced; a name collision picks the next free `-N` suffix. A CSV
    /// companion with the same stem is written next to it on a best-effort
    /// basis.
    pub fn persist(run: &BenchmarkRun, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|source| HarnessError::Persist {
            path: dir.to_path_buf(),
            source,
        })?;

        let (path, file) = Self::create_unique(dir, &run.file_stem())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, run).context("Failed to serialize run")?;
        writer
            .flush()
            .map_err(|source| HarnessError::Persist {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "run artifact written");

        let csv_path = path.with_extension("csv");
        if let Err(e) = Self::write_csv(run, &csv_path) {
            warn!(path = %csv_path.display(), error = %e, "failed to write CSV companion");
        }

        Ok(path)
    }

    fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}-{attempt}.json")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(HarnessError::Persist { path, source }.into()),
            }
        }
        unreachable!("u32 attempts exhausted")
    }

    fn write_csv(run: &BenchmarkRun, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut wtr = csv::Writer::from_writer(file);
        wtr.write_record(["key", "label", "value_ms", "attempts", "failures", "insert_failures"])?;
        for (key, stage) in run.results.stages() {
            for (label, value) in &stage.values {
                wtr.write_record(&[
                    key.to_string(),
                    label.clone(),
                    value.map(|v| format!("{v:.4}")).unwrap_or_default(),
                    stage.attempts.to_string(),
                    stage.failures.to_string(),
                    stage.insert_failures.to_string(),
                ])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn print_summary(run: &BenchmarkRun) {
        println!("\n═══════════════════════════════════════════════════════════");
        println!("  📊 Benchmark Results: {}", run.method);
        println!("═══════════════════════════════════════════════════════════");
        println!("   Store:      {}", run.config.base_url);
        println!("   Dimension:  {}", run.config.vector_dim);
        println!(
            "   Variant:    quantized={} simd={} distance={}",
            run.config.quantized, run.config.use_simd, run.config.distance_fn
        );
        println!("   Started:    {}", run.datetime.format("%Y-%m-%d %H:%M:%S"));
        println!();

        let labels = run.results.labels();
        // The POST scenario has one stage per call; a per-stage table is noise
        if let Some(latency) = &run.latency {
            println!("📈 Calls: {} ok, {} failed", latency.count, latency.failed);
            println!("   Min:    {:>10.3} ms", latency.min_ms);
            println!("   Mean:   {:>10.3} ms", latency.mean_ms);
            println!("   P50:    {:>10.3} ms", latency.p50_ms);
            println!("   P95:    {:>10.3} ms", latency.p95_ms);
            println!("   P99:    {:>10.3} ms", latency.p99_ms);
            println!("   Max:    {:>10.3} ms", latency.max_ms);
        } else {
            print!("   {:>8}", "vectors");
            for label in &labels {
                print!(" {:>20}", label);
            }
            println!(" {:>9}", "failures");
            for (key, stage) in run.results.stages() {
                print!("   {:>8}", key);
                for label in &labels {
                    match stage.value(label) {
                        Some(v) => print!(" {:>17.3} ms", v),
                        None => print!(" {:>20}", "-"),
                    }
                }
                println!(" {:>9}", stage.failures + stage.insert_failures);
            }
        }
        println!();
        println!("❌ Failed calls: {}", run.failures);
        println!("═══════════════════════════════════════════════════════════");
    }
}

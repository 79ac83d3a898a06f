use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use vfs_bench::client::DistanceFn;
use vfs_bench::config::{LogFormat, LogLevel};
use vfs_bench::{logging, run, BenchConfig, HarnessError, ResultsReporter, Scenario, Variant};

#[derive(Parser, Debug)]
#[command(name = "vfs-bench")]
#[command(about = "Latency benchmarks for the VFS vector store HTTP API")]
struct Args {
    /// Benchmark to run: GET, POST or SEARCH
    scenario: Option<String>,

    /// Config file (TOML/YAML/JSON); VFS_BENCH__* env vars override it
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Store base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Storage variant preset
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Override the quantization toggle
    #[arg(long)]
    quantized: Option<bool>,

    /// Override the SIMD toggle
    #[arg(long)]
    simd: Option<bool>,

    /// Scalar distance function
    #[arg(long, value_enum)]
    distance: Option<DistanceFn>,

    /// Vector dimension
    #[arg(long)]
    dim: Option<usize>,

    /// Inserts for the POST benchmark
    #[arg(long)]
    post_count: Option<usize>,

    /// Lookups per stage for the GET benchmark
    #[arg(long)]
    queries: Option<usize>,

    /// Per-stage insert counts, comma separated
    #[arg(long, value_delimiter = ',')]
    ranges: Option<Vec<usize>>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Chart output directory
    #[arg(long)]
    figs_folder: Option<PathBuf>,

    /// Artifact output directory
    #[arg(long)]
    logs_folder: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut BenchConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(variant) = self.variant {
            config.apply_variant(variant);
        }
        if let Some(q) = self.quantized {
            config.quantized = q;
        }
        if let Some(s) = self.simd {
            config.use_simd = s;
        }
        if let Some(d) = self.distance {
            config.distance_fn = d;
        }
        if let Some(dim) = self.dim {
            config.vector_dim = dim;
        }
        if let Some(n) = self.post_count {
            config.post_vector_count = n;
        }
        if let Some(k) = self.queries {
            config.num_queries_get = k;
        }
        if let Some(ranges) = &self.ranges {
            config.ranges_get_search = ranges.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(dir) = &self.figs_folder {
            config.figs_folder = dir.clone();
        }
        if let Some(dir) = &self.logs_folder {
            config.logs_folder = dir.clone();
        }
        if self.no_progress {
            config.show_progress = false;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = BenchConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let scenario: Scenario = args.scenario.as_deref().unwrap_or_default().parse()?;
    config.validate()?;
    logging::init_tracing(&config.logging);

    println!("🚀 VFS benchmark: {}", scenario);
    println!("   Store:   {}", config.base_url);
    println!("   Variant: quantized={} simd={}", config.quantized, config.use_simd);

    let outcome = run(&config, scenario).await.map_err(|e| {
        if let Some(HarnessError::Init { .. } | HarnessError::InitTransport(_)) =
            e.downcast_ref::<HarnessError>()
        {
            tracing::error!(error = %format!("{e:#}"), "aborting before any benchmark ran");
        }
        e
    })?;

    ResultsReporter::print_summary(&outcome.run);
    println!("\n✅ Results saved to: {}", outcome.artifact.display());
    if let Some(chart) = &outcome.chart {
        println!("✅ Chart saved to: {}", chart.display());
    }

    Ok(())
}

// bench/src/config.rs
//
// Benchmark configuration.
//
// Priority order (highest to lowest):
// 1. Command-line flags (applied by the binary after load())
// 2. Environment variables (VFS_BENCH__* prefix)
// 3. Config file (TOML/YAML/JSON)
// 4. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::client::DistanceFn;
use crate::error::HarnessError;

// ============================================================================
// Main Configuration Structure
// ============================================================================

/// Every tunable parameter of a benchmark run.
///
/// Constructed once by the CLI layer and handed by reference to the client,
/// the runners and the reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Base URL of the vector store HTTP API
    pub base_url: String,

    /// Per-request timeout applied by the HTTP transport (seconds)
    pub timeout_secs: u64,

    /// Storage name sent with `/init`
    pub storage_name: String,

    /// Ask the store to truncate existing data on `/init`
    pub truncate_data: bool,

    /// Dimensionality of every generated vector
    pub vector_dim: usize,

    /// Lower bound of generated component values
    pub value_low: f32,

    /// Upper bound of generated component values
    pub value_high: f32,

    /// Number of sequential inserts for the POST scenario
    pub post_vector_count: usize,

    /// Number of point lookups per stage for the GET scenario
    pub num_queries_get: usize,

    /// Per-stage insertion counts for the GET and SEARCH sweeps
    pub ranges_get_search: Vec<usize>,

    /// `top_k` sent with every search
    pub top_k: usize,

    /// `ef_search` sent with every search
    pub ef_search: usize,

    /// Scalar distance function; the SIMD variant is derived from it
    pub distance_fn: DistanceFn,

    /// Ask the store for quantized storage on `/init`
    pub quantized: bool,

    /// Also issue SIMD distance searches in the SEARCH scenario
    pub use_simd: bool,

    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,

    /// Directory for rendered charts
    pub figs_folder: PathBuf,

    /// Directory for persisted run artifacts
    pub logs_folder: PathBuf,

    /// Draw progress bars while inserting
    pub show_progress: bool,

    pub logging: LoggingConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9001".to_string(),
            timeout_secs: 30,
            storage_name: "vfs_benchmark".to_string(),
            truncate_data: true,
            vector_dim: 4,
            value_low: -10.0,
            value_high: 10.0,
            post_vector_count: 500,
            num_queries_get: 10,
            ranges_get_search: vec![10, 20, 30, 35, 45, 50, 75, 90, 200, 350, 500, 750, 1000],
            top_k: 3,
            ef_search: 6,
            distance_fn: DistanceFn::Euclidean,
            quantized: false,
            use_simd: false,
            seed: None,
            figs_folder: PathBuf::from("imgs"),
            logs_folder: PathBuf::from("logs"),
            show_progress: true,
            logging: LoggingConfig::default(),
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: LogLevel,

    /// Log format (json or text)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

// ============================================================================
// Scenario & Variant
// ============================================================================

/// Benchmark scenario selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "POST")]
    Insert,
    #[serde(rename = "GET")]
    Lookup,
    #[serde(rename = "SEARCH")]
    Search,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Insert => "POST",
            Scenario::Lookup => "GET",
            Scenario::Search => "SEARCH",
        }
    }
}

impl FromStr for Scenario {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POST" => Ok(Scenario::Insert),
            "GET" => Ok(Scenario::Lookup),
            "SEARCH" => Ok(Scenario::Search),
            other => Err(HarnessError::InvalidScenario(other.to_string())),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage/distance variant of the store under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Dense storage, scalar distance only
    Dense,
    /// Quantized storage, scalar and SIMD distance
    Quantized,
}

// ============================================================================
// Configuration Loading
// ============================================================================

const RANGES_ENV: &str = "VFS_BENCH__RANGES_GET_SEARCH";

impl BenchConfig {
    /// Load configuration with priority chain:
    /// 1. Environment variables (VFS_BENCH__*)
    /// 2. Config file (if provided)
    /// 3. Built-in defaults
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        let defaults = Self::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize defaults")?;
        builder = builder.add_source(::config::File::from_str(
            &defaults_json,
            ::config::FileFormat::Json,
        ));

        if let Some(path) = config_file {
            builder = builder.add_source(::config::File::with_name(path));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("VFS_BENCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // A lone stage count parses as a scalar, so the sweep list is read here
        if let Ok(raw) = std::env::var(RANGES_ENV) {
            let stages = raw
                .split(',')
                .map(|s| s.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid {RANGES_ENV} '{raw}'"))?;
            builder = builder
                .set_override("ranges_get_search", stages)
                .context("Failed to apply sweep override")?;
        }

        let settings = builder.build().context("Failed to build config")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }

    /// Apply a variant preset to the quantization and SIMD toggles.
    pub fn apply_variant(&mut self, variant: Variant) {
        match variant {
            Variant::Dense => {
                self.quantized = false;
                self.use_simd = false;
            }
            Variant::Quantized => {
                self.quantized = true;
                self.use_simd = true;
            }
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), HarnessError> {
        let fail = |msg: String| Err(HarnessError::InvalidConfig(msg));

        if self.base_url.trim().is_empty() {
            return fail("base_url cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return fail("timeout_secs must be > 0".to_string());
        }
        if self.vector_dim == 0 {
            return fail("vector_dim must be > 0".to_string());
        }
        if !self.value_low.is_finite() || !self.value_high.is_finite() {
            return fail(format!(
                "value range must be finite, got [{}, {}]",
                self.value_low, self.value_high
            ));
        }
        if self.value_low > self.value_high {
            return fail(format!(
                "value_low ({}) must not exceed value_high ({})",
                self.value_low, self.value_high
            ));
        }
        if self.ranges_get_search.is_empty() {
            return fail("ranges_get_search cannot be empty".to_string());
        }
        if let Some(pos) = self.ranges_get_search.iter().position(|&n| n == 0) {
            return fail(format!("ranges_get_search[{}] must be > 0", pos));
        }
        if self.post_vector_count == 0 {
            return fail("post_vector_count must be > 0".to_string());
        }
        if self.num_queries_get == 0 {
            return fail("num_queries_get must be > 0".to_string());
        }
        if self.top_k == 0 {
            return fail("top_k must be > 0".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = BenchConfig::default();
        config.validate().expect("Default config should be valid");
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("GET".parse::<Scenario>().unwrap(), Scenario::Lookup);
        assert_eq!("POST".parse::<Scenario>().unwrap(), Scenario::Insert);
        assert_eq!("SEARCH".parse::<Scenario>().unwrap(), Scenario::Search);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        for bad in ["get", "PUT", "", "SEARCH "] {
            let err = bad.parse::<Scenario>().unwrap_err();
            assert!(matches!(err, HarnessError::InvalidScenario(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_variant_presets() {
        let mut config = BenchConfig::default();
        config.apply_variant(Variant::Quantized);
        assert!(config.quantized && config.use_simd);
        config.apply_variant(Variant::Dense);
        assert!(!config.quantized && !config.use_simd);
    }

    #[test]
    fn test_zero_stage_count_rejected() {
        let mut config = BenchConfig::default();
        config.ranges_get_search = vec![10, 0, 30];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_sweep_rejected() {
        let mut config = BenchConfig::default();
        config.ranges_get_search.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = BenchConfig::default();
        config.value_low = 5.0;
        config.value_high = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = BenchConfig::default();
        config.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        match err {
            HarnessError::InvalidConfig(msg) => assert!(msg.contains("timeout_secs"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = BenchConfig::default();
        config.vector_dim = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_sweep() {
        let mut config = BenchConfig::default();
        config.ranges_get_search = vec![5, 10];
        config.seed = Some(7);
        let text = config.to_toml().unwrap();
        let parsed: BenchConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.ranges_get_search, vec![5, 10]);
        assert_eq!(parsed.seed, Some(7));
    }

    // load() reads the process environment; tests touching it take this lock
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const ENV_KEYS: [&str; 4] = [
        "VFS_BENCH__SEED",
        "VFS_BENCH__RANGES_GET_SEARCH",
        "VFS_BENCH__LOGGING__LEVEL",
        "VFS_BENCH__BASE_URL",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_config_file(dir: &std::path::Path) -> String {
        let path = dir.join("bench.toml");
        std::fs::write(
            &path,
            r#"
base_url = "http://file-store:7000"
vector_dim = 16
seed = 3
ranges_get_search = [1, 2, 3]

[logging]
level = "warn"
"#,
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_without_sources_gives_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = BenchConfig::load(None).unwrap();
        let defaults = BenchConfig::default();
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.ranges_get_search, defaults.ranges_get_search);
        assert_eq!(config.seed, None);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(dir.path());

        let config = BenchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://file-store:7000");
        assert_eq!(config.vector_dim, 16);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.ranges_get_search, vec![1, 2, 3]);
        assert_eq!(config.logging.level, LogLevel::Warn);
        // untouched keys keep their defaults
        assert_eq!(config.num_queries_get, 10);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_load_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config_file(dir.path());

        std::env::set_var("VFS_BENCH__SEED", "9");
        std::env::set_var("VFS_BENCH__RANGES_GET_SEARCH", "5,10");
        std::env::set_var("VFS_BENCH__LOGGING__LEVEL", "debug");
        let loaded = BenchConfig::load(Some(&path));
        clear_env();

        let config = loaded.unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.ranges_get_search, vec![5, 10]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        // not set in the environment, so the file wins
        assert_eq!(config.base_url, "http://file-store:7000");
        assert_eq!(config.vector_dim, 16);
    }

    #[test]
    fn test_load_env_without_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        std::env::set_var("VFS_BENCH__BASE_URL", "http://env-store:1");
        std::env::set_var("VFS_BENCH__RANGES_GET_SEARCH", "7");
        let loaded = BenchConfig::load(None);
        clear_env();

        let config = loaded.unwrap();
        assert_eq!(config.base_url, "http://env-store:1");
        assert_eq!(config.ranges_get_search, vec![7]);
    }

    #[test]
    fn test_load_rejects_malformed_sweep() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        std::env::set_var("VFS_BENCH__RANGES_GET_SEARCH", "5,ten");
        let loaded = BenchConfig::load(None);
        clear_env();

        assert!(loaded.is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
    }
}

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

pub mod http;

pub use http::HttpClient;

use crate::metrics::Sample;
use crate::workload::Vector;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Parameters of the single `/init` call made before any scenario runs.
#[derive(Debug, Clone, Serialize)]
pub struct InitRequest {
    pub vector_dimension: usize,
    pub storage_name: String,
    pub truncate_data: bool,
    pub quantize: bool,
}

/// Store-assigned id. The store may answer with a number or a string, the
/// harness only ever echoes it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VectorId(String);

impl VectorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VectorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(VectorId(s)),
            serde_json::Value::Number(n) => Ok(VectorId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            ))),
        }
    }
}

/// Record returned by a successful insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertedRecord {
    pub id: VectorId,
    pub name: String,
    pub tags: Vec<String>,
}

/// Vector record served by `GET /vectors/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorRecord {
    pub id: VectorId,
    pub values: Vec<f32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One hit of a ranked search response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub id: VectorId,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Exact,
    Approximate,
}

impl SearchType {
    pub const ALL: [SearchType; 2] = [SearchType::Exact, SearchType::Approximate];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Exact => "exact",
            SearchType::Approximate => "approximate",
        }
    }
}

/// Scalar distance function configured for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceFn {
    Euclidean,
    Cosine,
}

impl DistanceFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceFn::Euclidean => "euclidean",
            DistanceFn::Cosine => "cosine",
        }
    }
}

/// Distance method as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistanceMethod {
    pub function: DistanceFn,
    pub simd: bool,
}

impl DistanceMethod {
    pub fn scalar(function: DistanceFn) -> Self {
        Self { function, simd: false }
    }

    pub fn simd(function: DistanceFn) -> Self {
        Self { function, simd: true }
    }

    /// Short label used in result keys.
    pub fn label(&self) -> &'static str {
        if self.simd {
            "simd"
        } else {
            "scalar"
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match (self.function, self.simd) {
            (DistanceFn::Euclidean, false) => "euclidean",
            (DistanceFn::Cosine, false) => "cosine",
            (DistanceFn::Euclidean, true) => "simd_euclidean",
            (DistanceFn::Cosine, true) => "simd_cosine",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Vector,
    pub top_k: usize,
    pub ef_search: usize,
    pub search_type: SearchType,
    pub distance_method: DistanceMethod,
}

/// Result of a timed store call: the decoded payload (present only on
/// success) and the sample describing the call.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: Option<T>,
    pub sample: Sample,
}

/// Operations the harness drives against the vector store.
///
/// Only `init` may fail with `Err`; the other calls report failures through
/// the returned [`Sample`] so a runner can keep going.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// POST /init
    async fn init(&self, request: &InitRequest) -> Result<serde_json::Value>;

    /// POST /vectors
    async fn insert(&self, vector: &Vector, name: &str, tags: &[String]) -> Timed<InsertedRecord>;

    /// GET /vectors/{id}
    async fn get(&self, id: &VectorId) -> Timed<VectorRecord>;

    /// POST /search
    async fn search(&self, request: &SearchRequest) -> Timed<Vec<SearchHit>>;
}

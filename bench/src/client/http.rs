use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, warn};

use super::{
    ClientConfig, InitRequest, InsertedRecord, SearchHit, SearchRequest, StoreClient, Timed,
    VectorId, VectorRecord,
};
use crate::error::HarnessError;
use crate::metrics::{OperationKind, Sample};
use crate::workload::Vector;

/// HTTP client for the vector store API
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct InsertResponse {
    id: VectorId,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Raw result of one request: what came back and how long it took.
enum Exchange {
    Response { status: StatusCode, body: Vec<u8> },
    Transport(reqwest::Error),
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            // The store closes the socket after every response
            .pool_max_idle_per_host(0)
            .timeout(config.timeout)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a prepared request and read the full body.
    ///
    /// The clock runs from just before the request is handed to the
    /// transport until the body has been read; building and serializing the
    /// request happens before and decoding happens after.
    async fn exchange(&self, request: reqwest::RequestBuilder) -> (Exchange, std::time::Duration) {
        let request = match request.build() {
            Ok(request) => request,
            Err(e) => return (Exchange::Transport(e), std::time::Duration::ZERO),
        };

        let start = Instant::now();
        let exchange = match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                match response.bytes().await {
                    Ok(body) => Exchange::Response {
                        status,
                        body: body.to_vec(),
                    },
                    Err(e) => Exchange::Transport(e),
                }
            }
            Err(e) => Exchange::Transport(e),
        };
        (exchange, start.elapsed())
    }

    /// Turn an exchange into a sample, logging anything unexpected.
    fn classify(
        kind: OperationKind,
        target: &str,
        expected: StatusCode,
        exchange: Exchange,
        elapsed: std::time::Duration,
    ) -> (Sample, Option<Vec<u8>>) {
        match exchange {
            Exchange::Response { status, body } if status == expected => {
                debug!(op = %kind, target, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "ok");
                (Sample::success(kind, elapsed), Some(body))
            }
            Exchange::Response { status, body } => {
                let text = String::from_utf8_lossy(&body).into_owned();
                warn!(
                    op = %kind,
                    target,
                    status = status.as_u16(),
                    body = %text,
                    "store call failed"
                );
                (
                    Sample::failure(kind, elapsed, Some(status.as_u16()), text),
                    None,
                )
            }
            Exchange::Transport(e) => {
                warn!(op = %kind, target, error = %e, "store call failed");
                (Sample::failure(kind, elapsed, None, e.to_string()), None)
            }
        }
    }
}

#[async_trait]
impl StoreClient for HttpClient {
    async fn init(&self, request: &InitRequest) -> Result<serde_json::Value> {
        let url = format!("{}/init", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| HarnessError::InitTransport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HarnessError::InitTransport(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(HarnessError::Init {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }

    async fn insert(&self, vector: &Vector, name: &str, tags: &[String]) -> Timed<InsertedRecord> {
        let url = format!("{}/vectors", self.base_url);
        let request = self.client.post(&url).json(&json!({
            "values": vector.values(),
            "name": name,
            "tags": tags,
        }));

        let (exchange, elapsed) = self.exchange(request).await;
        let (sample, body) =
            Self::classify(OperationKind::Insert, name, StatusCode::CREATED, exchange, elapsed);

        let Some(body) = body else {
            return Timed { value: None, sample };
        };

        match serde_json::from_slice::<InsertResponse>(&body) {
            Ok(response) => Timed {
                value: Some(InsertedRecord {
                    id: response.id,
                    name: name.to_string(),
                    tags: tags.to_vec(),
                }),
                sample,
            },
            Err(e) => {
                warn!(op = "insert", target = name, error = %e, "insert response carried no id");
                Timed {
                    value: None,
                    sample: Sample::failure(
                        OperationKind::Insert,
                        elapsed,
                        Some(StatusCode::CREATED.as_u16()),
                        format!("undecodable insert response: {e}"),
                    ),
                }
            }
        }
    }

    async fn get(&self, id: &VectorId) -> Timed<VectorRecord> {
        let url = format!("{}/vectors/{}", self.base_url, id);
        let (exchange, elapsed) = self.exchange(self.client.get(&url)).await;
        let (sample, body) =
            Self::classify(OperationKind::Get, id.as_str(), StatusCode::OK, exchange, elapsed);

        Timed {
            value: body.and_then(|b| serde_json::from_slice(&b).ok()),
            sample,
        }
    }

    async fn search(&self, request: &SearchRequest) -> Timed<Vec<SearchHit>> {
        let url = format!("{}/search", self.base_url);
        let http_request = self.client.post(&url).json(&json!({
            "values": request.query.values(),
            "top_k": request.top_k,
            "ef_search": request.ef_search,
            "search_type": request.search_type.as_str(),
            "distance_method": request.distance_method.wire_name(),
        }));

        let target = format!(
            "{}/{}",
            request.search_type.as_str(),
            request.distance_method.wire_name()
        );
        let (exchange, elapsed) = self.exchange(http_request).await;
        let (sample, body) =
            Self::classify(OperationKind::Search, &target, StatusCode::OK, exchange, elapsed);

        Timed {
            value: body
                .and_then(|b| serde_json::from_slice::<SearchResponse>(&b).ok())
                .map(|r| r.results),
            sample,
        }
    }
}

//! In-process vector store speaking the harness's HTTP API.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Everything the mock saw, plus knobs that change how it answers.
#[derive(Default)]
pub struct MockState {
    pub init_requests: Vec<Value>,
    pub insert_bodies: Vec<Value>,
    pub get_ids: Vec<String>,
    pub search_bodies: Vec<Value>,
    pub vectors: BTreeMap<u64, Value>,

    /// Answer `/init` with this status instead of 200
    pub init_status: Option<u16>,
    /// Answer every insert with 400
    pub reject_inserts: bool,
    /// Hand out ids as JSON strings instead of numbers
    pub string_ids: bool,
    next_id: u64,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockStore {
    pub addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockStore {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/init", post(init))
            .route("/vectors", post(insert))
            .route("/vectors/:id", get(get_vector))
            .route("/search", post(search))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl Drop for MockStore {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn init(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.init_requests.push(body.clone());

    if let Some(code) = state.init_status {
        let status = StatusCode::from_u16(code).unwrap();
        return (status, Json(json!({ "error": "init rejected" })));
    }
    if body["truncate_data"].as_bool().unwrap_or(false) {
        state.vectors.clear();
    }
    (StatusCode::OK, Json(json!({ "status": "initialized" })))
}

async fn insert(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.insert_bodies.push(body.clone());

    if state.reject_inserts {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad vector" })));
    }

    state.next_id += 1;
    let id = state.next_id;
    state.vectors.insert(id, body.clone());
    let id_value = if state.string_ids {
        json!(id.to_string())
    } else {
        json!(id)
    };
    (
        StatusCode::CREATED,
        Json(json!({ "id": id_value, "name": body["name"] })),
    )
}

async fn get_vector(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.get_ids.push(id.clone());

    let stored = id.parse::<u64>().ok().and_then(|n| state.vectors.get(&n).cloned());
    match stored {
        Some(body) => (
            StatusCode::OK,
            Json(json!({
                "id": id,
                "values": body["values"],
                "name": body["name"],
                "tags": body["tags"],
            })),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
    }
}

async fn search(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.search_bodies.push(body.clone());

    let top_k = body["top_k"].as_u64().unwrap_or(0) as usize;
    let results: Vec<Value> = state
        .vectors
        .keys()
        .take(top_k)
        .map(|id| json!({ "id": id, "distance": 0.5 }))
        .collect();
    (StatusCode::OK, Json(json!({ "results": results })))
}

//! In-memory store with scripted failures and latencies.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::{
    InitRequest, InsertedRecord, SearchHit, SearchRequest, StoreClient, Timed, VectorId,
    VectorRecord,
};
use crate::metrics::{OperationKind, Sample};
use crate::workload::Vector;

#[derive(Default)]
struct State {
    insert_calls: usize,
    next_id: u64,
    last_id: Option<VectorId>,
    vectors: HashMap<VectorId, Vec<f32>>,
    inserted: Vec<Vec<f32>>,
    gets: Vec<VectorId>,
    searches: Vec<(usize, String)>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<State>,
    failing_inserts: HashSet<usize>,
    duplicate_at: Option<usize>,
    failing_gets: HashSet<String>,
    fail_every_get: bool,
    get_latency_from_id: bool,
    failing_search_type: Option<String>,
    pub(crate) fail_init: bool,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the inserts at these 0-based call positions.
    pub(crate) fn fail_inserts(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_inserts.extend(calls);
        self
    }

    /// Answer the insert at this call position with the previous id.
    pub(crate) fn repeat_id_at(mut self, call: usize) -> Self {
        self.duplicate_at = Some(call);
        self
    }

    pub(crate) fn fail_get_ids<'s>(mut self, ids: impl IntoIterator<Item = &'s str>) -> Self {
        self.failing_gets.extend(ids.into_iter().map(str::to_string));
        self
    }

    pub(crate) fn fail_all_gets(mut self) -> Self {
        self.fail_every_get = true;
        self
    }

    /// GET of numeric id `n` takes `n` milliseconds.
    pub(crate) fn get_latency_from_id(mut self) -> Self {
        self.get_latency_from_id = true;
        self
    }

    pub(crate) fn fail_search(mut self, search_type: &str) -> Self {
        self.failing_search_type = Some(search_type.to_string());
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap().vectors.len()
    }

    pub(crate) fn inserted_vectors(&self) -> Vec<Vec<f32>> {
        self.state.lock().unwrap().inserted.clone()
    }

    pub(crate) fn get_calls(&self) -> Vec<VectorId> {
        self.state.lock().unwrap().gets.clone()
    }

    /// `(stored vectors at call time, wire distance method)` per search.
    pub(crate) fn search_calls(&self) -> Vec<(usize, String)> {
        self.state.lock().unwrap().searches.clone()
    }
}

fn ok(kind: OperationKind, ms: u64) -> Sample {
    Sample::success(kind, Duration::from_millis(ms))
}

fn server_error(kind: OperationKind) -> Sample {
    Sample::failure(kind, Duration::ZERO, Some(500), "scripted failure")
}

#[async_trait]
impl StoreClient for FakeStore {
    async fn init(&self, request: &InitRequest) -> Result<serde_json::Value> {
        anyhow::ensure!(!self.fail_init, "scripted init failure");
        Ok(serde_json::json!({ "status": "initialized", "dim": request.vector_dimension }))
    }

    async fn insert(&self, vector: &Vector, name: &str, tags: &[String]) -> Timed<InsertedRecord> {
        let mut state = self.state.lock().unwrap();
        let call = state.insert_calls;
        state.insert_calls += 1;
        state.inserted.push(vector.values().to_vec());

        if self.failing_inserts.contains(&call) {
            return Timed {
                value: None,
                sample: server_error(OperationKind::Insert),
            };
        }

        let id = match (&state.last_id, self.duplicate_at) {
            (Some(last), Some(dup)) if dup == call => last.clone(),
            _ => {
                state.next_id += 1;
                VectorId::new(state.next_id.to_string())
            }
        };
        state.vectors.insert(id.clone(), vector.values().to_vec());
        state.last_id = Some(id.clone());

        Timed {
            value: Some(InsertedRecord {
                id,
                name: name.to_string(),
                tags: tags.to_vec(),
            }),
            sample: ok(OperationKind::Insert, 1),
        }
    }

    async fn get(&self, id: &VectorId) -> Timed<VectorRecord> {
        let mut state = self.state.lock().unwrap();
        state.gets.push(id.clone());

        if self.fail_every_get || self.failing_gets.contains(id.as_str()) {
            return Timed {
                value: None,
                sample: server_error(OperationKind::Get),
            };
        }

        let latency = if self.get_latency_from_id {
            id.as_str().parse().unwrap_or(1)
        } else {
            1
        };
        Timed {
            value: state.vectors.get(id).map(|values| VectorRecord {
                id: id.clone(),
                values: values.clone(),
                name: String::new(),
                tags: Vec::new(),
            }),
            sample: ok(OperationKind::Get, latency),
        }
    }

    async fn search(&self, request: &SearchRequest) -> Timed<Vec<SearchHit>> {
        let mut state = self.state.lock().unwrap();
        let stored = state.vectors.len();
        state
            .searches
            .push((stored, request.distance_method.wire_name().to_string()));

        if self.failing_search_type.as_deref() == Some(request.search_type.as_str()) {
            return Timed {
                value: None,
                sample: server_error(OperationKind::Search),
            };
        }

        let hits = state
            .vectors
            .keys()
            .take(request.top_k)
            .map(|id| SearchHit {
                id: id.clone(),
                distance: 0.0,
            })
            .collect();
        Timed {
            value: Some(hits),
            sample: ok(OperationKind::Search, 2),
        }
    }
}

//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use psynth_core::ServerConfig;
use psynth_graph::{Graph, Transport, TransportError};

/// Records every request and answers from a FIFO of canned responses
/// (`{}` once the script runs out). When gated, each request waits for a
/// permit released by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<Value>>,
    provisioned: Mutex<Vec<Value>>,
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport that holds every request until [`release`](Self::release).
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        })
    }

    pub fn respond(&self, response: Value) {
        self.responses.lock().push_back(Ok(response));
    }

    pub fn fail_transport(&self, reason: &str) {
        self.responses
            .lock()
            .push_back(Err(TransportError::Unavailable(reason.to_string())));
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn provisioned(&self) -> Vec<Value> {
        self.provisioned.lock().clone()
    }

    /// The `query` of every request received, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["query"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<Value, TransportError> {
        self.responses.lock().pop_front().unwrap_or_else(|| Ok(json!({})))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Value) -> Result<Value, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().push(request);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        // Give any wrongly spawned concurrent sender a chance to overlap.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let response = self.next_response();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn provision(&self, request: Value) -> Result<Value, TransportError> {
        self.provisioned.lock().push(request);
        self.next_response()
    }
}

pub fn config() -> ServerConfig {
    ServerConfig {
        url: "https://psynth.example.com".into(),
        user: "alice".into(),
        password: "secret".into(),
        accept_invalid_certs: false,
    }
}

pub fn graph(transport: &Arc<ScriptedTransport>) -> Graph {
    Graph::new(&config(), "Test Graph", "test.gt", transport.clone()).expect("graph")
}

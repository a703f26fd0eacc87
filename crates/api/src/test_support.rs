//! Deterministic service doubles for router tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use story_gateway_common::{Embedding, GatewayError, Result, StoryMatch};
use story_gateway_knowledge::{
    DeleteRequest, Embedder, MemoryVectorStore, QueryRequest, StoryService, StorySettings,
    UpsertRequest, VectorStore,
};
use tower::ServiceExt;

use crate::AppState;

const DIMENSIONS: usize = 256;

/// Bag-of-words embedding: each lowercase word bumps one hashed dimension.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(GatewayError::Embedding("provider unavailable".to_string()))
    }
}

pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn query(&self, _request: QueryRequest) -> Result<Vec<StoryMatch>> {
        Err(GatewayError::VectorStore("index unavailable".to_string()))
    }

    async fn upsert(&self, _request: UpsertRequest) -> Result<()> {
        Err(GatewayError::VectorStore("index unavailable".to_string()))
    }

    async fn delete(&self, _request: DeleteRequest) -> Result<()> {
        Err(GatewayError::VectorStore("index unavailable".to_string()))
    }

    async fn health(&self) -> Result<()> {
        Err(GatewayError::VectorStore("index unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn state(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> AppState {
    let settings = StorySettings {
        namespace: "test".to_string(),
        ..Default::default()
    };
    AppState::new(StoryService::new(embedder, store, settings), None)
}

pub fn keyword_state() -> AppState {
    state(Arc::new(KeywordEmbedder), Arc::new(MemoryVectorStore::new()))
}

pub fn failing_embedder_state() -> AppState {
    state(Arc::new(FailingEmbedder), Arc::new(MemoryVectorStore::new()))
}

pub fn failing_store_state() -> AppState {
    state(Arc::new(KeywordEmbedder), Arc::new(FailingStore))
}

/// Sends one request; JSON bodies come back parsed, anything else as a string value.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

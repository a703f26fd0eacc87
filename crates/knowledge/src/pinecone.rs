//! Pinecone vector store over its REST data-plane API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use story_gateway_common::{Embedding, GatewayError, Result, StoryMatch, VectorRecord};
use tracing::{debug, info};

use crate::vector_store::{DeleteRequest, QueryRequest, UpsertRequest, VectorStore};

#[derive(Debug, Clone, Default)]
pub struct PineconeConfig {
    pub api_key: String,
    pub environment: Option<String>,
    pub index_name: Option<String>,
    /// Full index host. When set, no controller lookup happens at startup.
    pub index_host: Option<String>,
}

pub struct PineconeStore {
    client: Client,
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PineconeQuery {
    vector: Embedding,
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    namespace: String,
}

#[derive(Deserialize)]
struct PineconeQueryResponse {
    #[serde(default)]
    matches: Vec<StoryMatch>,
}

#[derive(Serialize)]
struct PineconeUpsert {
    vectors: Vec<VectorRecord>,
    #[serde(skip_serializing_if = "String::is_empty")]
    namespace: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PineconeUpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Serialize)]
struct PineconeDelete {
    ids: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    namespace: String,
}

#[derive(Deserialize)]
struct WhoAmIResponse {
    project_name: String,
}

impl PineconeStore {
    /// Resolves the index host and confirms the index answers before returning.
    pub async fn connect(config: &PineconeConfig) -> Result<Self> {
        let client = build_client(&config.api_key)?;

        let host = match &config.index_host {
            Some(host) => normalize_host(host),
            None => {
                let environment = config.environment.as_deref().ok_or_else(|| {
                    GatewayError::Configuration("PINECONE_ENVIRONMENT is not set".to_string())
                })?;
                let index_name = config.index_name.as_deref().ok_or_else(|| {
                    GatewayError::Configuration("PINECONE_INDEX_NAME is not set".to_string())
                })?;
                resolve_index_host(&client, &controller_url(environment), index_name, environment)
                    .await?
            }
        };

        let store = Self { client, host };
        store.health().await?;
        info!("Connected to Pinecone index at {}", store.host);
        Ok(store)
    }

    /// Builds a store against a known host without touching the network.
    pub fn with_host(api_key: &str, host: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(api_key)?,
            host: normalize_host(host),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::VectorStore(format!("request to {} failed: {}", path, e)))?;

        decode(path, response).await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(&self, request: QueryRequest) -> Result<Vec<StoryMatch>> {
        let body = PineconeQuery {
            vector: request.vector,
            top_k: request.top_k,
            include_values: false,
            include_metadata: true,
            namespace: request.namespace,
        };

        let response: PineconeQueryResponse = self.post("/query", &body).await?;
        debug!("{} records found", response.matches.len());
        Ok(response.matches)
    }

    async fn upsert(&self, request: UpsertRequest) -> Result<()> {
        let body = PineconeUpsert {
            vectors: request.records,
            namespace: request.namespace,
        };

        let response: PineconeUpsertResponse = self.post("/vectors/upsert", &body).await?;
        debug!("Upserted {} vectors", response.upserted_count);
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        let body = PineconeDelete {
            ids: request.ids,
            namespace: request.namespace,
        };

        let _: serde_json::Value = self.post("/vectors/delete", &body).await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let _: serde_json::Value = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}

fn build_client(api_key: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "api-key",
        HeaderValue::from_str(api_key.trim())
            .map_err(|_| GatewayError::Configuration("invalid Pinecone API key".to_string()))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| GatewayError::VectorStore(format!("failed to build HTTP client: {}", e)))
}

async fn decode<R: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<R> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::VectorStore(format!(
            "{} returned {}: {}",
            path, status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| GatewayError::VectorStore(format!("invalid response from {}: {}", path, e)))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn controller_url(environment: &str) -> String {
    format!("https://controller.{}.pinecone.io", environment)
}

fn index_host_url(index_name: &str, project_name: &str, environment: &str) -> String {
    format!("https://{}-{}.svc.{}.pinecone.io", index_name, project_name, environment)
}

/// Asks the controller which project the API key belongs to and derives the index host.
async fn resolve_index_host(
    client: &Client,
    controller: &str,
    index_name: &str,
    environment: &str,
) -> Result<String> {
    let path = "/actions/whoami";
    let response = client
        .get(format!("{}{}", controller, path))
        .send()
        .await
        .map_err(|e| GatewayError::VectorStore(format!("request to {} failed: {}", path, e)))?;

    let whoami: WhoAmIResponse = decode(path, response).await?;
    Ok(index_host_url(index_name, &whoami.project_name, environment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap as AxumHeaders, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use story_gateway_common::{Story, StoryMetadata};

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    fn capture(captured: &Captured, path: &str, headers: &AxumHeaders, body: Value) {
        assert_eq!(headers.get("api-key").unwrap(), "test-key");
        captured.lock().unwrap().push((path.to_string(), body));
    }

    async fn fake_pinecone() -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/query",
                post(|State(c): State<Captured>, headers: AxumHeaders, Json(body): Json<Value>| async move {
                    capture(&c, "/query", &headers, body);
                    Json(json!({
                        "matches": [
                            { "id": "a", "score": 0.91, "values": [], "metadata": { "title": "Dawn", "body": "Morning light" } },
                            { "id": "b", "score": 0.42, "values": [], "metadata": { "title": "Dusk", "body": "Evening" } }
                        ],
                        "namespace": "stories"
                    }))
                }),
            )
            .route(
                "/vectors/upsert",
                post(|State(c): State<Captured>, headers: AxumHeaders, Json(body): Json<Value>| async move {
                    capture(&c, "/vectors/upsert", &headers, body);
                    Json(json!({ "upsertedCount": 1 }))
                }),
            )
            .route(
                "/vectors/delete",
                post(|State(c): State<Captured>, headers: AxumHeaders, Json(body): Json<Value>| async move {
                    capture(&c, "/vectors/delete", &headers, body);
                    Json(json!({}))
                }),
            )
            .route(
                "/describe_index_stats",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "index is initializing") }),
            )
            .route(
                "/actions/whoami",
                get(|| async { Json(json!({ "project_name": "p42", "user_label": "default", "user_name": "u" })) }),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), captured)
    }

    #[test]
    fn test_host_helpers() {
        assert_eq!(normalize_host("idx-p.svc.env.pinecone.io/"), "https://idx-p.svc.env.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
        assert_eq!(controller_url("us-west1-gcp"), "https://controller.us-west1-gcp.pinecone.io");
        assert_eq!(
            index_host_url("stories", "abc123", "us-west1-gcp"),
            "https://stories-abc123.svc.us-west1-gcp.pinecone.io"
        );
    }

    #[test]
    fn test_query_body_shape() {
        let body = PineconeQuery {
            vector: vec![0.5],
            top_k: 20,
            include_values: false,
            include_metadata: true,
            namespace: String::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, json!({ "vector": [0.5], "topK": 20, "includeValues": false, "includeMetadata": true }));
    }

    #[tokio::test]
    async fn test_query_sends_namespace_and_parses_matches() {
        let (host, captured) = fake_pinecone().await;
        let store = PineconeStore::with_host("test-key", &host).unwrap();

        let matches = store
            .query(QueryRequest::new(vec![0.1, 0.2], 20, "stories"))
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(
            matches[0].metadata,
            StoryMetadata { title: "Dawn".to_string(), body: "Morning light".to_string() }
        );

        let captured = captured.lock().unwrap();
        let (path, body) = &captured[0];
        assert_eq!(path, "/query");
        assert_eq!(body["topK"], 20);
        assert_eq!(body["namespace"], "stories");
        assert_eq!(body["includeMetadata"], true);
    }

    #[tokio::test]
    async fn test_upsert_and_delete_bodies() {
        let (host, captured) = fake_pinecone().await;
        let store = PineconeStore::with_host("test-key", &host).unwrap();
        let story = Story::with_id("s1", "Dawn", "Morning light");

        store
            .upsert(UpsertRequest {
                records: vec![VectorRecord::from_story(&story, vec![1.0, 0.0])],
                namespace: "stories".to_string(),
            })
            .await
            .unwrap();
        store
            .delete(DeleteRequest { ids: vec!["s1".to_string()], namespace: String::new() })
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(
            captured[0].1,
            json!({
                "vectors": [{ "id": "s1", "values": [1.0, 0.0], "metadata": { "title": "Dawn", "body": "Morning light" } }],
                "namespace": "stories"
            })
        );
        assert_eq!(captured[1].0, "/vectors/delete");
        assert_eq!(captured[1].1, json!({ "ids": ["s1"] }));
    }

    #[tokio::test]
    async fn test_error_status_becomes_vector_store_error() {
        let (host, _captured) = fake_pinecone().await;
        let store = PineconeStore::with_host("test-key", &host).unwrap();

        let err = store.health().await.unwrap_err();
        match err {
            GatewayError::VectorStore(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("index is initializing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_index_host_uses_project_name() {
        let (controller, _captured) = fake_pinecone().await;
        let client = build_client("test-key").unwrap();

        let host = resolve_index_host(&client, &controller, "stories", "us-west1-gcp")
            .await
            .unwrap();
        assert_eq!(host, "https://stories-p42.svc.us-west1-gcp.pinecone.io");
    }

    #[tokio::test]
    async fn test_connect_requires_environment_without_host() {
        let config = PineconeConfig {
            api_key: "test-key".to_string(),
            index_name: Some("stories".to_string()),
            ..Default::default()
        };

        let err = PineconeStore::connect(&config).await.err().unwrap();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        assert!(PineconeStore::with_host("bad\nkey", "http://localhost").is_err());
    }
}

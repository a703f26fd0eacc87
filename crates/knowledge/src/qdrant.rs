use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
        PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Payload, Qdrant,
};
use story_gateway_common::{GatewayError, Result, StoryMatch, StoryMetadata, VectorRecord};
use tracing::{debug, info};
use uuid::Uuid;

use crate::vector_store::{DeleteRequest, QueryRequest, UpsertRequest, VectorStore};

pub const DEFAULT_COLLECTION: &str = "stories";

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub dimension: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
            dimension: 1536,
        }
    }
}

/// Qdrant-backed store. Story ids and namespaces live in the point payload,
/// since Qdrant point ids must be UUIDs and it has no namespaces of its own.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    pub async fn connect(config: &QdrantConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(qdrant_error)?;

        let store = Self {
            client,
            collection: config.collection.clone(),
        };
        store.ensure_collection(config.dimension).await?;

        info!("Connected to Qdrant collection {}", store.collection);
        Ok(store)
    }

    async fn ensure_collection(&self, dimension: u64) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(qdrant_error)?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            info!("Creating Qdrant collection: {}", self.collection);
            let create = CreateCollectionBuilder::new(&self.collection)
                .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine));
            self.client
                .create_collection(create)
                .await
                .map_err(qdrant_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn query(&self, request: QueryRequest) -> Result<Vec<StoryMatch>> {
        let search = SearchPointsBuilder::new(&self.collection, request.vector, request.top_k as u64)
            .filter(Filter::must([Condition::matches(
                "namespace",
                request.namespace,
            )]))
            .with_payload(true);

        let response = self.client.search_points(search).await.map_err(qdrant_error)?;

        let matches: Vec<StoryMatch> = response
            .result
            .into_iter()
            .map(|point| {
                let text = |key: &str| {
                    point
                        .payload
                        .get(key)
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                };

                StoryMatch {
                    id: text("story_id"),
                    score: point.score,
                    values: Vec::new(),
                    metadata: StoryMetadata {
                        title: text("title"),
                        body: text("body"),
                    },
                }
            })
            .collect();

        debug!("{} records found", matches.len());
        Ok(matches)
    }

    async fn upsert(&self, request: UpsertRequest) -> Result<()> {
        let points = request
            .records
            .into_iter()
            .map(|record| to_point(&request.namespace, record))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(qdrant_error)?;
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        let ids = request
            .ids
            .iter()
            .map(|id| point_id(&request.namespace, id).into())
            .collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids })
                    .wait(true),
            )
            .await
            .map_err(qdrant_error)?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        self.client.health_check().await.map_err(qdrant_error)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "qdrant"
    }
}

/// Deterministic point id for a story id within a namespace.
pub fn point_id(namespace: &str, story_id: &str) -> String {
    let name = format!("{}:{}/{}", namespace.len(), namespace, story_id);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

fn story_payload(namespace: &str, record: &VectorRecord) -> serde_json::Value {
    serde_json::json!({
        "story_id": record.id,
        "namespace": namespace,
        "title": record.metadata.title,
        "body": record.metadata.body,
    })
}

fn to_point(namespace: &str, record: VectorRecord) -> Result<PointStruct> {
    let payload: Payload = story_payload(namespace, &record)
        .try_into()
        .map_err(qdrant_error)?;

    Ok(PointStruct::new(
        point_id(namespace, &record.id),
        record.values,
        payload,
    ))
}

fn qdrant_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::VectorStore(e.to_string())
}

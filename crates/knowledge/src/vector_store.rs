use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use story_gateway_common::{Embedding, Result, StoryMatch, VectorRecord};
use tokio::sync::RwLock;

/// Nearest-neighbour query against one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub vector: Embedding,
    pub top_k: usize,
    pub namespace: String,
}

impl QueryRequest {
    pub fn new(vector: Embedding, top_k: usize, namespace: impl Into<String>) -> Self {
        Self {
            vector,
            top_k,
            namespace: namespace.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub records: Vec<VectorRecord>,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<String>,
    pub namespace: String,
}

/// Hosted vector index. An empty namespace addresses the default partition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `top_k` matches, best first.
    async fn query(&self, request: QueryRequest) -> Result<Vec<StoryMatch>>;

    /// Inserts the records, replacing any existing record with the same id.
    async fn upsert(&self, request: UpsertRequest) -> Result<()>;

    /// Removes the ids. Ids that do not exist are ignored.
    async fn delete(&self, request: DeleteRequest) -> Result<()>;

    async fn health(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// In-process store with exact cosine similarity, for local runs and tests.
#[derive(Default)]
pub struct MemoryVectorStore {
    namespaces: RwLock<HashMap<String, HashMap<String, VectorRecord>>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn query(&self, request: QueryRequest) -> Result<Vec<StoryMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(&request.namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<StoryMatch> = records
            .values()
            .map(|record| StoryMatch {
                id: record.id.clone(),
                score: cosine_similarity(&request.vector, &record.values),
                values: Vec::new(),
                metadata: record.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(request.top_k);
        Ok(matches)
    }

    async fn upsert(&self, request: UpsertRequest) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let records = namespaces.entry(request.namespace).or_default();
        for record in request.records {
            records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        if let Some(records) = namespaces.get_mut(&request.namespace) {
            for id in &request.ids {
                records.remove(id);
            }
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Cosine similarity; zero when either vector has no magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

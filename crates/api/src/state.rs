use std::sync::Arc;
use story_gateway_common::Result;
use story_gateway_knowledge::{
    DocumentStore, Embedder, MemoryVectorStore, OpenAiEmbedder, PineconeStore, QdrantStore,
    StoryService, VectorStore,
};
use tracing::{info, warn};

use crate::config::{GatewayConfig, VectorStoreKind};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub stories: Arc<StoryService>,
    pub documents: Option<Arc<DocumentStore>>,
}

impl AppState {
    pub fn new(stories: StoryService, documents: Option<DocumentStore>) -> Self {
        Self {
            stories: Arc::new(stories),
            documents: documents.map(Arc::new),
        }
    }

    /// Builds every external client in order and returns the first failure.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(
            OpenAiEmbedder::new(config.openai_api_key.clone()).with_model(&config.embedding_model),
        );
        info!("Embedding provider ready (model {})", config.embedding_model);

        let store: Arc<dyn VectorStore> = match config.vector_store {
            VectorStoreKind::Pinecone => Arc::new(PineconeStore::connect(&config.pinecone_config()).await?),
            VectorStoreKind::Qdrant => Arc::new(QdrantStore::connect(&config.qdrant_config()).await?),
            VectorStoreKind::Memory => {
                warn!("Using the in-memory vector store; stories are lost on restart");
                Arc::new(MemoryVectorStore::new())
            }
        };

        let documents = match &config.document_database_url {
            Some(url) => Some(DocumentStore::connect(url).await?),
            None => {
                info!("No document database configured");
                None
            }
        };

        let stories = StoryService::new(embedder, store, config.story_settings());
        Ok(Self::new(stories, documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Environment;
    use std::collections::HashMap;

    fn memory_config(extra: &[(&str, &str)]) -> GatewayConfig {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("VECTOR_STORE".to_string(), "memory".to_string()),
            ("OPENAI_API_KEY".to_string(), "sk-test".to_string()),
            ("PINECONE_NAME_SPACE".to_string(), "social".to_string()),
        ]);
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        GatewayConfig::from_environment(Environment::default().source(Some(vars))).unwrap()
    }

    #[tokio::test]
    async fn test_connect_with_memory_store() {
        let state = AppState::connect(&memory_config(&[])).await.unwrap();

        assert_eq!(state.stories.store().name(), "memory");
        assert_eq!(state.stories.settings().namespace, "social");
        assert!(state.documents.is_none());
    }

    #[tokio::test]
    async fn test_connect_opens_document_database() {
        let state = AppState::connect(&memory_config(&[("DOCUMENT_DATABASE_URL", "sqlite::memory:")]))
            .await
            .unwrap();

        let documents = state.documents.expect("document database connected");
        assert!(documents.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_fails_fast_on_bad_document_database() {
        let result = AppState::connect(&memory_config(&[(
            "DOCUMENT_DATABASE_URL",
            "sqlite:/nonexistent-dir/deeper/documents.db",
        )]))
        .await;

        assert!(result.is_err());
    }
}

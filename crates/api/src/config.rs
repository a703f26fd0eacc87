use config::{Config, Environment};
use serde::Deserialize;
use story_gateway_common::{GatewayError, Result};
use story_gateway_knowledge::{
    embedder::DEFAULT_EMBEDDING_MODEL,
    qdrant::DEFAULT_COLLECTION,
    story_service::{DEFAULT_LIST_QUERY_TEXT, DEFAULT_LIST_TOP_K, DEFAULT_SEARCH_TOP_K},
    PineconeConfig, QdrantConfig, StorySettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    Pinecone,
    Qdrant,
    Memory,
}

/// Gateway settings, read from environment variables (case-insensitive).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    // Embedding provider
    pub openai_api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: u64,

    // Vector store
    #[serde(default = "default_vector_store")]
    pub vector_store: VectorStoreKind,
    pub pinecone_api_key: Option<String>,
    pub pinecone_environment: Option<String>,
    pub pinecone_index_name: Option<String>,
    pub pinecone_index_host: Option<String>,
    #[serde(default)]
    pub pinecone_name_space: String,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,

    // Document database
    pub document_database_url: Option<String>,

    // Story queries
    #[serde(default = "default_list_query_text")]
    pub list_query_text: String,
    #[serde(default = "default_list_top_k")]
    pub list_top_k: usize,
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    // Frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

fn default_port() -> u16 {
    5001
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimension() -> u64 {
    1536
}

fn default_vector_store() -> VectorStoreKind {
    VectorStoreKind::Pinecone
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_qdrant_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_list_query_text() -> String {
    DEFAULT_LIST_QUERY_TEXT.to_string()
}

fn default_list_top_k() -> usize {
    DEFAULT_LIST_TOP_K
}

fn default_search_top_k() -> usize {
    DEFAULT_SEARCH_TOP_K
}

fn default_static_dir() -> String {
    "./web/build".to_string()
}

fn default_assets_dir() -> String {
    "static".to_string()
}

impl GatewayConfig {
    /// Reads the process environment. Call `dotenv` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::default())
    }

    pub fn from_environment(environment: Environment) -> Result<Self> {
        Config::builder()
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| GatewayError::Configuration(e.to_string()))
    }

    /// Checks that the selected backends have what they need to connect.
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.openai_api_key) {
            return Err(missing("OPENAI_API_KEY"));
        }

        if self.vector_store == VectorStoreKind::Pinecone {
            if is_blank(&self.pinecone_api_key) {
                return Err(missing("PINECONE_API_KEY"));
            }
            if is_blank(&self.pinecone_index_host) {
                if is_blank(&self.pinecone_environment) {
                    return Err(missing("PINECONE_ENVIRONMENT"));
                }
                if is_blank(&self.pinecone_index_name) {
                    return Err(missing("PINECONE_INDEX_NAME"));
                }
            }
        }

        if self.list_top_k == 0 || self.search_top_k == 0 {
            return Err(GatewayError::Configuration(
                "LIST_TOP_K and SEARCH_TOP_K must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn pinecone_config(&self) -> PineconeConfig {
        PineconeConfig {
            api_key: self.pinecone_api_key.clone().unwrap_or_default(),
            environment: present(&self.pinecone_environment),
            index_name: present(&self.pinecone_index_name),
            index_host: present(&self.pinecone_index_host),
        }
    }

    pub fn qdrant_config(&self) -> QdrantConfig {
        QdrantConfig {
            url: self.qdrant_url.clone(),
            api_key: self.qdrant_api_key.clone(),
            collection: self.qdrant_collection.clone(),
            dimension: self.embedding_dimension,
        }
    }

    pub fn story_settings(&self) -> StorySettings {
        StorySettings {
            namespace: self.pinecone_name_space.clone(),
            list_query_text: self.list_query_text.clone(),
            list_top_k: self.list_top_k,
            search_top_k: self.search_top_k,
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn missing(variable: &str) -> GatewayError {
    GatewayError::Configuration(format!("{} is not set", variable))
}

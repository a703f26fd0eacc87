//! Embedding provider and vector store clients, and the story operations built on them.

pub mod document_store;
pub mod embedder;
pub mod pinecone;
pub mod qdrant;
pub mod story_service;
pub mod vector_store;

pub use document_store::DocumentStore;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use pinecone::{PineconeConfig, PineconeStore};
pub use qdrant::{QdrantConfig, QdrantStore};
pub use story_service::{StoryService, StorySettings};
pub use vector_store::{DeleteRequest, MemoryVectorStore, QueryRequest, UpsertRequest, VectorStore};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vector returned by the embedding provider. Opaque to the gateway.
pub type Embedding = Vec<f32>;

// Story types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub body: String,
}

impl Story {
    /// Creates a story under a freshly generated identifier.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, body)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    /// Text handed to the embedding provider: title and body joined by a space.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }

    pub fn metadata(&self) -> StoryMetadata {
        StoryMetadata {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

/// Request body for creating or replacing a story.
///
/// Both fields are optional on the wire so that a missing field surfaces as a
/// failed operation rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl StoryInput {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }

    /// Turns the input into a story, generating an id when none is given.
    /// Empty strings are accepted; absent fields are not.
    pub fn into_story(self, id: Option<String>) -> Result<Story> {
        let title = self
            .title
            .ok_or_else(|| GatewayError::InvalidInput("title is missing".to_string()))?;
        let body = self
            .body
            .ok_or_else(|| GatewayError::InvalidInput("body is missing".to_string()))?;

        Ok(match id {
            Some(id) => Story::with_id(id, title, body),
            None => Story::new(title, body),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

// Vector store types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Embedding,
    pub metadata: StoryMetadata,
}

impl VectorRecord {
    pub fn from_story(story: &Story, values: Embedding) -> Self {
        Self {
            id: story.id.clone(),
            values,
            metadata: story.metadata(),
        }
    }
}

/// One nearest-neighbour hit, passed through to clients as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Embedding,
    #[serde(default)]
    pub metadata: StoryMetadata,
}

// API response types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(message: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: Some(id.into()),
        }
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Document database error: {0}")]
    DocumentStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

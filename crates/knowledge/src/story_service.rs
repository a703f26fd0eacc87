use std::sync::Arc;
use story_gateway_common::{Result, Story, StoryInput, StoryMatch, VectorRecord};
use tracing::{debug, info};

use crate::embedder::Embedder;
use crate::vector_store::{DeleteRequest, QueryRequest, UpsertRequest, VectorStore};

pub const DEFAULT_LIST_QUERY_TEXT: &str = "retreated";
pub const DEFAULT_LIST_TOP_K: usize = 100;
pub const DEFAULT_SEARCH_TOP_K: usize = 20;

#[derive(Debug, Clone)]
pub struct StorySettings {
    pub namespace: String,
    /// Placeholder text embedded to produce the listing query vector.
    pub list_query_text: String,
    pub list_top_k: usize,
    pub search_top_k: usize,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            list_query_text: DEFAULT_LIST_QUERY_TEXT.to_string(),
            list_top_k: DEFAULT_LIST_TOP_K,
            search_top_k: DEFAULT_SEARCH_TOP_K,
        }
    }
}

/// Story operations: each one embeds (if needed) and then makes one vector store call.
pub struct StoryService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: StorySettings,
}

impl StoryService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, settings: StorySettings) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &StorySettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub async fn list_stories(&self) -> Result<Vec<StoryMatch>> {
        let vector = self.embedder.embed(&self.settings.list_query_text).await?;
        let matches = self
            .store
            .query(QueryRequest::new(vector, self.settings.list_top_k, &self.settings.namespace))
            .await?;

        info!("{} records found", matches.len());
        Ok(matches)
    }

    pub async fn search_stories(&self, query: &str) -> Result<Vec<StoryMatch>> {
        debug!("Searching stories for: {}", query);

        let vector = self.embedder.embed(query).await?;
        let matches = self
            .store
            .query(QueryRequest::new(vector, self.settings.search_top_k, &self.settings.namespace))
            .await?;

        debug!("{} matches for search", matches.len());
        Ok(matches)
    }

    /// Stores a new story under a generated id and returns it.
    pub async fn create_story(&self, input: StoryInput) -> Result<Story> {
        let story = input.into_story(None)?;
        self.put(&story).await?;

        info!("Story {} created", story.id);
        Ok(story)
    }

    /// Replaces the record at `id`. A missing record is simply created.
    pub async fn update_story(&self, id: &str, input: StoryInput) -> Result<Story> {
        let story = input.into_story(Some(id.to_string()))?;
        self.put(&story).await?;

        info!("Story {} updated", story.id);
        Ok(story)
    }

    pub async fn delete_story(&self, id: &str) -> Result<()> {
        self.store
            .delete(DeleteRequest {
                ids: vec![id.to_string()],
                namespace: self.settings.namespace.clone(),
            })
            .await?;

        info!("Story {} deleted", id);
        Ok(())
    }

    async fn put(&self, story: &Story) -> Result<()> {
        let vector = self.embedder.embed(&story.embedding_text()).await?;
        self.store
            .upsert(UpsertRequest {
                records: vec![VectorRecord::from_story(story, vector)],
                namespace: self.settings.namespace.clone(),
            })
            .await
    }
}

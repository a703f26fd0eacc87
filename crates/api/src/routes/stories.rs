use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use story_gateway_common::{MessageResponse, StoryInput, StoryMatch};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    routes::not_found_handler,
    AppState,
};

pub const INTERNAL_ERROR: &str = "Internal server error";
pub const STORY_CREATED: &str = "Story created successfully";
pub const CREATE_FAILED: &str = "Failed to create story, please try later";
pub const STORY_UPDATED: &str = "Story updated successfully";
pub const UPDATE_FAILED: &str = "Failed to update story, please try later";
pub const STORY_DELETED: &str = "Story deleted successfully";
pub const DELETE_FAILED: &str = "Failed to delete story, please try later";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/stories", get(list_stories).fallback(not_found_handler))
        .route("/search", get(search_stories).fallback(not_found_handler))
        .route("/story", post(create_story).fallback(not_found_handler))
        .route(
            "/story/:id",
            put(update_story)
                .delete(delete_story)
                .fallback(not_found_handler),
        )
        .with_state(state)
}

async fn list_stories(State(state): State<AppState>) -> ApiResult<Json<Vec<StoryMatch>>> {
    let matches = state
        .stories
        .list_stories()
        .await
        .map_err(ApiError::failed(INTERNAL_ERROR))?;

    Ok(Json(matches))
}

async fn search_stories(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<StoryMatch>>> {
    let matches = state
        .stories
        .search_stories(&params.q)
        .await
        .map_err(ApiError::failed(INTERNAL_ERROR))?;

    Ok(Json(matches))
}

async fn create_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryInput>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(input) = payload.map_err(ApiError::body(CREATE_FAILED))?;
    debug!("Create story request: {:?}", input);

    let story = state
        .stories
        .create_story(input)
        .await
        .map_err(ApiError::failed(CREATE_FAILED))?;

    Ok(Json(MessageResponse::with_id(STORY_CREATED, story.id)))
}

async fn update_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StoryInput>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(input) = payload.map_err(ApiError::body(UPDATE_FAILED))?;
    debug!("Update story {} request: {:?}", id, input);

    state
        .stories
        .update_story(&id, input)
        .await
        .map_err(ApiError::failed(UPDATE_FAILED))?;

    Ok(Json(MessageResponse::new(STORY_UPDATED)))
}

async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .stories
        .delete_story(&id)
        .await
        .map_err(ApiError::failed(DELETE_FAILED))?;

    Ok(Json(MessageResponse::new(STORY_DELETED)))
}

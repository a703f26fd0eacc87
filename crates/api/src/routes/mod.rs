pub mod health;
pub mod stories;

use axum::{http::StatusCode, Router};

use crate::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Health check routes
        .nest("/health", health::routes(state.clone()))
        // Story API
        .nest("/api/v1", stories::routes(state))
}

// Fallback handler for unmatched routes
pub async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

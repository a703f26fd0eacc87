use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{routes::not_found_handler, AppState};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check).fallback(not_found_handler))
        .route("/ready", get(readiness_check).fallback(not_found_handler))
        .route("/live", get(liveness_check).fallback(not_found_handler))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    debug!("Health check requested");

    Json(json!({
        "status": "healthy",
        "service": "story-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "vector_store": state.stories.store().name(),
        "document_database": state.documents.is_some(),
    }))
}

// Readiness probe: every configured external dependency must answer
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    debug!("Readiness check requested");

    let vector_store = match state.stories.store().health().await {
        Ok(()) => "ready",
        Err(e) => {
            warn!("Vector store not ready: {}", e);
            "not_ready"
        }
    };

    let document_database = match &state.documents {
        Some(documents) => match documents.ping().await {
            Ok(()) => "ready",
            Err(e) => {
                warn!("Document database not ready: {}", e);
                "not_ready"
            }
        },
        None => "not_configured",
    };

    let ready = vector_store == "ready" && document_database != "not_ready";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "timestamp": chrono::Utc::now(),
            "checks": {
                "vector_store": vector_store,
                "document_database": document_database,
            }
        })),
    )
}

// Liveness probe
async fn liveness_check() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "timestamp": chrono::Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_store_state, keyword_state, send};
    use axum::http::Method;

    #[tokio::test]
    async fn test_health_check() {
        let app = routes(keyword_state());

        let (status, body) = send(&app, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["vector_store"], "memory");
        assert_eq!(body["document_database"], false);
    }

    #[tokio::test]
    async fn test_readiness_check() {
        let app = routes(keyword_state());

        let (status, body) = send(&app, Method::GET, "/ready", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["vector_store"], "ready");
        assert_eq!(body["checks"]["document_database"], "not_configured");
    }

    #[tokio::test]
    async fn test_readiness_fails_when_store_is_down() {
        let app = routes(failing_store_state());

        let (status, body) = send(&app, Method::GET, "/ready", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");
    }

    #[tokio::test]
    async fn test_liveness_check() {
        let app = routes(keyword_state());

        let (status, body) = send(&app, Method::GET, "/live", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");
    }
}

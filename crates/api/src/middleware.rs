use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::{any::Any, time::Duration};
use story_gateway_common::MessageResponse;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

use crate::routes::stories::INTERNAL_ERROR;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AnyOrigin)
        .expose_headers([REQUEST_ID.clone()])
        .max_age(Duration::from_secs(3600))
}

// Request ID middleware
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&request_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert(REQUEST_ID.clone(), value.clone());
    }

    let mut response = next.run(request).await;

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }

    response
}

/// Renders a handler panic as the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!("Unhandled panic in request handler: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::new(INTERNAL_ERROR)),
    )
        .into_response()
}

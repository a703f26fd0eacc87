use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use story_gateway_common::{GatewayError, MessageResponse};
use thiserror::Error;
use tracing::error;

/// A failed story operation. Every variant renders as a 500 carrying the
/// route's fixed message; the cause only goes to the log.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}: {source}")]
    Failed {
        message: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("{message}: unreadable request body: {reason}")]
    Body {
        message: &'static str,
        reason: String,
    },
}

impl ApiError {
    /// `map_err` adapter for service results.
    pub fn failed(message: &'static str) -> impl FnOnce(GatewayError) -> ApiError {
        move |source| ApiError::Failed { message, source }
    }

    /// `map_err` adapter for body extraction failures.
    pub fn body(message: &'static str) -> impl FnOnce(JsonRejection) -> ApiError {
        move |rejection| ApiError::Body {
            message,
            reason: rejection.body_text(),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::Failed { message, .. } | ApiError::Body { message, .. } => *message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{}", self);

        let body = MessageResponse::new(self.message());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::{GatewayConfig, VectorStoreKind};
pub use error::{ApiError, ApiResult};
pub use server::{build_app, ApiServer};
pub use state::AppState;

// Re-export shared crates
pub use story_gateway_common;
pub use story_gateway_knowledge;

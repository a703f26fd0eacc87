use crate::{
    middleware::{cors_layer, handle_panic, request_id_middleware},
    routes::{create_routes, not_found_handler},
    AppState, GatewayConfig,
};
use axum::{handler::HandlerWithoutStateExt, Router};
use std::{net::SocketAddr, path::Path};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

pub struct ApiServer {
    config: GatewayConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        build_app(
            self.state.clone(),
            &self.config.static_dir,
            &self.config.assets_dir,
        )
    }

    pub async fn start(self) -> std::io::Result<()> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));

        info!("Starting story gateway on {}", addr);
        info!("Vector store: {}", self.state.stories.store().name());
        info!("Serving frontend from {}", self.config.static_dir);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(documents) = &self.state.documents {
            documents.close().await;
        }

        info!("Story gateway stopped");
        Ok(())
    }
}

/// API routes, then `/static` assets, then the frontend build for everything else.
pub fn build_app(state: AppState, static_dir: impl AsRef<Path>, assets_dir: impl AsRef<Path>) -> Router {
    let frontend = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found_handler.into_service());

    let assets = ServeDir::new(assets_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found_handler.into_service());

    create_routes(state)
        .nest_service("/static", assets)
        .fallback_service(frontend)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors_layer())
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

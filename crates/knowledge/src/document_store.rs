use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use story_gateway_common::{GatewayError, Result};
use tracing::{debug, info, instrument};

/// Document database connection.
///
/// Connected during startup so a misconfigured database stops the process
/// before it accepts requests. No story route reads or writes it; only the
/// readiness probe does.
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to document database");

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| GatewayError::DocumentStore(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| {
                GatewayError::DocumentStore(format!("Failed to create connection pool: {}", e))
            })?;

        let store = Self { pool };
        store.ping().await?;

        info!("Connected to document database");
        Ok(store)
    }

    pub async fn ping(&self) -> Result<()> {
        debug!("Pinging document database");
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::DocumentStore(format!("Connectivity check failed: {}", e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

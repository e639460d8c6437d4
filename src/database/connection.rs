use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{ProcessorError, ProcessorResult};

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Open a pool from configuration, falling back to `DATABASE_URL`
    pub async fn connect(config: &DatabaseConfig) -> ProcessorResult<Self> {
        let database_url = if config.url.is_empty() {
            std::env::var("DATABASE_URL").map_err(|_| {
                ProcessorError::ConfigurationError(
                    "database.url is empty and DATABASE_URL is not set".to_string(),
                )
            })?
        } else {
            config.url.clone()
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(u64::from(config.acquire_timeout_seconds)))
            .connect(&database_url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "✅ Database pool connected"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await?;

        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

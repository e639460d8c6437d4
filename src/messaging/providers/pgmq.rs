//! # PGMQ Queue Service
//!
//! Queue provider backed by the pgmq PostgreSQL extension, sharing the
//! datastore's connection pool.

use async_trait::async_trait;
use pgmq::PGMQueue;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};

use crate::messaging::service::{QueueService, QueuedMessage};
use crate::messaging::MessagingError;

#[derive(Debug, Clone)]
pub struct PgmqQueueService {
    pgmq: PGMQueue,
}

impl PgmqQueueService {
    /// Create a queue service on an existing pool (bring your own pool)
    pub async fn new_with_pool(pool: PgPool) -> Self {
        info!("🚀 Creating pgmq queue service with shared connection pool");
        let pgmq = PGMQueue::new_with_pool(pool).await;
        Self { pgmq }
    }

    /// Create a queue if it doesn't exist
    pub async fn ensure_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "create", e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pgmq.connection
    }
}

#[async_trait]
impl QueueService for PgmqQueueService {
    async fn read_batch(
        &self,
        queue_name: &str,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage>, MessagingError> {
        let vt = i32::try_from(visibility_timeout.as_secs()).unwrap_or(i32::MAX);
        let qty = i32::try_from(max_messages).unwrap_or(i32::MAX);

        let messages = self
            .pgmq
            .read_batch::<serde_json::Value>(queue_name, Some(vt), qty)
            .await
            .map_err(|e| MessagingError::read(queue_name, e.to_string()))?
            .unwrap_or_default();

        debug!(
            queue = %queue_name,
            count = messages.len(),
            "📨 Read messages from queue"
        );

        Ok(messages
            .into_iter()
            .map(|m| QueuedMessage {
                msg_id: m.msg_id,
                read_count: u32::try_from(m.read_ct).unwrap_or(0),
                enqueued_at: m.enqueued_at,
                payload: m.message,
            })
            .collect())
    }

    async fn delete_message(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        let deleted = self
            .pgmq
            .delete(queue_name, msg_id)
            .await
            .map_err(|e| MessagingError::delete(queue_name, msg_id, e.to_string()))?;

        if deleted == 0 {
            return Err(MessagingError::message_not_found(queue_name, msg_id));
        }
        Ok(())
    }

    async fn send_message(
        &self,
        queue_name: &str,
        message: &serde_json::Value,
    ) -> Result<i64, MessagingError> {
        self.pgmq
            .send(queue_name, message)
            .await
            .map_err(|e| MessagingError::send(queue_name, e.to_string()))
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        sqlx::query("SELECT 1")
            .execute(&self.pgmq.connection)
            .await
            .map(|_| true)
            .map_err(MessagingError::from)
    }

    fn provider_name(&self) -> &'static str {
        "pgmq"
    }
}

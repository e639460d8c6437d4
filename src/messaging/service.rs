//! # Queue Service Abstraction
//!
//! Provider-agnostic access to the named priority queues. The processor only
//! needs leased batch reads, deletes and sends; visibility-timeout expiry is the
//! retry mechanism, so there is no explicit nack.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

use super::MessagingError;

/// A message leased from a queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub msg_id: i64,
    /// Deliveries so far, including this one
    pub read_count: u32,
    pub enqueued_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl QueuedMessage {
    /// Deliveries before this one
    pub fn previous_deliveries(&self) -> u32 {
        self.read_count.saturating_sub(1)
    }
}

#[async_trait]
pub trait QueueService: Send + Sync + Debug {
    /// Lease up to `max_messages` visible messages for `visibility_timeout`
    async fn read_batch(
        &self,
        queue_name: &str,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage>, MessagingError>;

    async fn delete_message(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError>;

    async fn send_message(
        &self,
        queue_name: &str,
        message: &serde_json::Value,
    ) -> Result<i64, MessagingError>;

    async fn health_check(&self) -> Result<bool, MessagingError>;

    fn provider_name(&self) -> &'static str;
}

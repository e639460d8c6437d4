//! # In-Memory Queue Service
//!
//! Queue implementation for testing and development.
//!
//! - **Visibility timeout**: a read message stays hidden until the injected
//!   clock passes its lease, then becomes readable again with a higher
//!   read count
//! - **Thread-safe**: `tokio::sync::RwLock` around the queue map

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::clock::{system_clock, Clock};
use crate::messaging::service::{QueueService, QueuedMessage};
use crate::messaging::MessagingError;

#[derive(Debug, Clone)]
struct InMemoryQueuedMessage {
    id: i64,
    payload: serde_json::Value,
    enqueued_at: DateTime<Utc>,
    /// When the message becomes visible again (None = visible now)
    visible_at: Option<DateTime<Utc>>,
    read_count: u32,
}

#[derive(Debug, Default)]
struct InMemoryQueue {
    messages: VecDeque<InMemoryQueuedMessage>,
    next_id: i64,
}

#[derive(Debug)]
pub struct InMemoryQueueService {
    queues: RwLock<HashMap<String, InMemoryQueue>>,
    clock: Arc<dyn Clock>,
    healthy: AtomicBool,
}

impl Default for InMemoryQueueService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueueService {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            clock,
            healthy: AtomicBool::new(true),
        }
    }

    /// Create with pre-initialized queues
    pub fn with_queues(queue_names: &[&str], clock: Arc<dyn Clock>) -> Self {
        let queues = queue_names
            .iter()
            .map(|name| (name.to_string(), InMemoryQueue::default()))
            .collect();
        Self {
            queues: RwLock::new(queues),
            clock,
            healthy: AtomicBool::new(true),
        }
    }

    pub async fn ensure_queue(&self, queue_name: &str) {
        self.queues
            .write()
            .await
            .entry(queue_name.to_string())
            .or_default();
    }

    /// Number of messages in a queue, leased or not (for testing)
    pub async fn queue_length(&self, queue_name: &str) -> usize {
        self.queues
            .read()
            .await
            .get(queue_name)
            .map(|q| q.messages.len())
            .unwrap_or(0)
    }

    /// Payloads currently stored in a queue (for testing)
    pub async fn payloads(&self, queue_name: &str) -> Vec<serde_json::Value> {
        self.queues
            .read()
            .await
            .get(queue_name)
            .map(|q| q.messages.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    /// Make `health_check` report the backend as down
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn read_batch(
        &self,
        queue_name: &str,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage>, MessagingError> {
        let lease = chrono::Duration::from_std(visibility_timeout)
            .map_err(|e| MessagingError::read(queue_name, e.to_string()))?;

        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let now = self.clock.now();
        let mut received = Vec::new();

        for msg in queue.messages.iter_mut() {
            if received.len() >= max_messages as usize {
                break;
            }

            let is_visible = msg.visible_at.map(|vt| vt <= now).unwrap_or(true);
            if is_visible {
                msg.visible_at = Some(now + lease);
                msg.read_count += 1;
                received.push(QueuedMessage {
                    msg_id: msg.id,
                    read_count: msg.read_count,
                    enqueued_at: msg.enqueued_at,
                    payload: msg.payload.clone(),
                });
            }
        }

        Ok(received)
    }

    async fn delete_message(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        match queue.messages.iter().position(|m| m.id == msg_id) {
            Some(pos) => {
                queue.messages.remove(pos);
                Ok(())
            }
            None => Err(MessagingError::message_not_found(queue_name, msg_id)),
        }
    }

    async fn send_message(
        &self,
        queue_name: &str,
        message: &serde_json::Value,
    ) -> Result<i64, MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        queue.next_id += 1;
        let id = queue.next_id;
        queue.messages.push_back(InMemoryQueuedMessage {
            id,
            payload: message.clone(),
            enqueued_at: self.clock.now(),
            visible_at: None,
            read_count: 0,
        });

        Ok(id)
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        Ok(self.healthy.load(Ordering::Relaxed))
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn service() -> (InMemoryQueueService, ManualClock) {
        let clock = ManualClock::default();
        let service = InMemoryQueueService::with_queues(&["q"], Arc::new(clock.clone()));
        (service, clock)
    }

    #[tokio::test]
    async fn test_send_read_delete() {
        let (service, _clock) = service();
        let id = service.send_message("q", &json!({"n": 1})).await.unwrap();

        let messages = service.read_batch("q", 10, Duration::from_secs(30)).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].msg_id, id);
        assert_eq!(messages[0].read_count, 1);
        assert_eq!(messages[0].previous_deliveries(), 0);

        service.delete_message("q", id).await.unwrap();
        assert_eq!(service.queue_length("q").await, 0);
        assert!(service.delete_message("q", id).await.is_err());
    }

    #[tokio::test]
    async fn test_visibility_timeout_redelivers() {
        let (service, clock) = service();
        service.send_message("q", &json!({"n": 1})).await.unwrap();

        let first = service.read_batch("q", 10, Duration::from_secs(30)).await.unwrap();
        assert_eq!(first.len(), 1);

        // Still leased
        clock.advance(chrono::Duration::seconds(29));
        let hidden = service.read_batch("q", 10, Duration::from_secs(30)).await.unwrap();
        assert!(hidden.is_empty());

        clock.advance(chrono::Duration::seconds(2));
        let again = service.read_batch("q", 10, Duration::from_secs(30)).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].read_count, 2);
    }

    #[tokio::test]
    async fn test_batch_limit_and_missing_queue() {
        let (service, _clock) = service();
        for n in 0..15 {
            service.send_message("q", &json!({"n": n})).await.unwrap();
        }
        let batch = service.read_batch("q", 10, Duration::from_secs(30)).await.unwrap();
        assert_eq!(batch.len(), 10);
        assert_eq!(batch[0].payload, json!({"n": 0}));

        let err = service
            .read_batch("missing", 10, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::QueueNotFound { .. }));
    }
}

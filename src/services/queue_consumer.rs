//! # Priority Queue Consumer
//!
//! Drains the four priority tiers in strict order, one batch per tier per
//! invocation. Successful messages are deleted; failed ones are left to
//! reappear when their visibility timeout lapses, until the retry budget is
//! spent and they are moved to the dead-letter queue.

use std::sync::Arc;
use tracing::{debug, warn};

use super::TaskHandlers;
use crate::clock::Clock;
use crate::config::QueuesConfig;
use crate::error::ProcessorError;
use crate::logging::log_queue_operation;
use crate::messaging::{QueueService, QueuedMessage};
use crate::models::{DeadLetterRecord, PriorityTier, ProcessingResult, TaskMessage};

/// Per-drain message counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    pub processed: u64,
    pub failed: u64,
    pub dead_lettered: u64,
}

#[derive(Debug, Clone)]
pub struct QueueConsumer {
    queue: Arc<dyn QueueService>,
    handlers: TaskHandlers,
    config: QueuesConfig,
    clock: Arc<dyn Clock>,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn QueueService>,
        handlers: TaskHandlers,
        config: QueuesConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            handlers,
            config,
            clock,
        }
    }

    /// Read and process one batch from every tier, critical first
    pub async fn drain(&self, result: &mut ProcessingResult) -> DrainSummary {
        let mut summary = DrainSummary::default();

        for tier in PriorityTier::DRAIN_ORDER {
            let queue_name = self.config.queue_for(tier);
            let messages = match self
                .queue
                .read_batch(
                    queue_name,
                    self.config.batch_size,
                    self.config.visibility_timeout(),
                )
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    log_queue_operation("read", queue_name, None, "failed", Some(&e.to_string()));
                    result.record_error(format!("Failed to read {tier} queue: {e}"));
                    continue;
                }
            };

            debug!(tier = %tier, count = messages.len(), "Read queue batch");

            for message in &messages {
                self.process_message(tier, queue_name, message, result, &mut summary)
                    .await;
            }
        }

        summary
    }

    async fn process_message(
        &self,
        tier: PriorityTier,
        queue_name: &str,
        message: &QueuedMessage,
        result: &mut ProcessingResult,
        summary: &mut DrainSummary,
    ) {
        let parsed = serde_json::from_value::<TaskMessage>(message.payload.clone());

        let outcome = match &parsed {
            Ok(task) => self.handlers.handle(task).await,
            Err(e) => Err(ProcessorError::InvalidRequest(format!(
                "Malformed task message: {e}"
            ))),
        };

        match outcome {
            Ok(detail) => {
                let task_type = parsed
                    .as_ref()
                    .map(|t| t.task_type.to_string())
                    .unwrap_or_default();

                if let Err(e) = self.queue.delete_message(queue_name, message.msg_id).await {
                    // The message will be redelivered; handlers are idempotent
                    warn!(msg_id = message.msg_id, error = %e, "Failed to delete processed message");
                    result.record_error(format!(
                        "Failed to delete message {} from {tier} queue: {e}",
                        message.msg_id
                    ));
                }

                log_queue_operation("process", queue_name, Some(message.msg_id), "success", Some(&detail));
                result.record_processed(1);
                result.record_operation(format!(
                    "Processed {task_type} message {} from {tier} queue",
                    message.msg_id
                ));
                summary.processed += 1;
            }
            Err(e) => {
                let error = e.to_string();
                log_queue_operation("process", queue_name, Some(message.msg_id), "failed", Some(&error));
                result.record_error(format!(
                    "Failed to process message {} from {tier} queue: {error}",
                    message.msg_id
                ));
                summary.failed += 1;

                let retries = effective_retry_count(message);
                if retries >= self.config.max_retries
                    && self
                        .dead_letter(tier, queue_name, message, &error, retries, result)
                        .await
                {
                    summary.dead_lettered += 1;
                }
            }
        }
    }

    /// Move an exhausted message to the dead-letter queue.
    ///
    /// The original stays in its tier unless the dead-letter send succeeded.
    async fn dead_letter(
        &self,
        tier: PriorityTier,
        queue_name: &str,
        message: &QueuedMessage,
        error: &str,
        retries: u32,
        result: &mut ProcessingResult,
    ) -> bool {
        let record = DeadLetterRecord {
            original_message: message.payload.clone(),
            source_queue: queue_name.to_string(),
            error: error.to_string(),
            failed_at: self.clock.now(),
        };

        let sent = match serde_json::to_value(&record) {
            Ok(body) => self
                .queue
                .send_message(&self.config.dead_letter, &body)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(e) = sent {
            result.record_error(format!(
                "Failed to dead-letter message {} from {tier} queue: {e}",
                message.msg_id
            ));
            return false;
        }

        if let Err(e) = self.queue.delete_message(queue_name, message.msg_id).await {
            result.record_error(format!(
                "Dead-lettered message {} could not be removed from {tier} queue: {e}",
                message.msg_id
            ));
        }

        log_queue_operation(
            "dead_letter",
            queue_name,
            Some(message.msg_id),
            "moved",
            Some(&self.config.dead_letter),
        );
        result.record_operation(format!(
            "Dead-lettered message {} from {tier} queue after {retries} retries",
            message.msg_id
        ));
        true
    }
}

/// Retries already spent on a message.
///
/// Redelivery after a visibility timeout does not rewrite the payload, so the
/// queue's delivery count is authoritative once it exceeds the stored value.
pub fn effective_retry_count(message: &QueuedMessage) -> u32 {
    let stored = message
        .payload
        .get("retry_count")
        .and_then(|v| v.as_u64())
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
    stored.max(message.previous_deliveries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn queued(read_count: u32, payload: serde_json::Value) -> QueuedMessage {
        QueuedMessage {
            msg_id: 1,
            read_count,
            enqueued_at: Utc::now(),
            payload,
        }
    }

    #[test]
    fn test_effective_retry_count_uses_larger_source() {
        assert_eq!(effective_retry_count(&queued(1, json!({"retry_count": 3}))), 3);
        assert_eq!(effective_retry_count(&queued(5, json!({"retry_count": 1}))), 4);
        assert_eq!(effective_retry_count(&queued(1, json!("not an object"))), 0);
    }
}

//! Priority draining, retries and dead-lettering through the full processor.

mod common;

use chrono::Duration;
use common::TestHarness;
use farm_automation::constants::queues;
use farm_automation::messaging::QueueService;
use farm_automation::models::{DeadLetterRecord, PriorityTier, QueueTaskType, TaskMessage};
use serde_json::json;

fn reading_message(priority: PriorityTier, entity_id: &str) -> serde_json::Value {
    let message = TaskMessage::new(
        priority,
        QueueTaskType::SensorReading,
        json!({
            "entity_id": entity_id,
            "temperature": 21.5,
            "recorded_at": "2026-03-01T12:00:00Z"
        }),
    );
    serde_json::to_value(message).unwrap()
}

fn drain_request() -> serde_json::Value {
    json!({"task_type": "queue_cleanup", "queue_process": true})
}

#[tokio::test]
async fn test_critical_tier_drains_before_normal() {
    let harness = TestHarness::new();
    harness
        .queue
        .send_message(queues::NORMAL, &reading_message(PriorityTier::Normal, "sensor.normal"))
        .await
        .unwrap();
    harness
        .queue
        .send_message(queues::CRITICAL, &reading_message(PriorityTier::Critical, "sensor.critical"))
        .await
        .unwrap();

    let result = harness.processor.invoke(&drain_request()).await;
    assert!(result.success);
    assert_eq!(result.error_count, 0);

    let position = |tier: &str| {
        result
            .operations
            .iter()
            .position(|op| op.ends_with(&format!("from {tier} queue")))
            .unwrap_or_else(|| panic!("no {tier} operation in {:?}", result.operations))
    };
    assert!(position("critical") < position("normal"));

    assert_eq!(harness.queue.queue_length(queues::CRITICAL).await, 0);
    assert_eq!(harness.queue.queue_length(queues::NORMAL).await, 0);
    assert_eq!(harness.datastore.sensor_readings().len(), 2);
}

#[tokio::test]
async fn test_exhausted_message_is_dead_lettered_once() {
    let harness = TestHarness::new();
    let mut message = TaskMessage::new(
        PriorityTier::Critical,
        QueueTaskType::Unknown("irrigate".to_string()),
        json!({}),
    );
    message.retry_count = 3;
    let body = serde_json::to_value(&message).unwrap();
    harness.queue.send_message(queues::CRITICAL, &body).await.unwrap();

    let result = harness.processor.invoke(&drain_request()).await;

    assert!(result.success);
    assert!(result.error_count >= 1);
    assert_eq!(harness.queue.queue_length(queues::CRITICAL).await, 0);

    let dead = harness.queue.payloads(queues::DEAD_LETTER).await;
    assert_eq!(dead.len(), 1);
    let record: DeadLetterRecord = serde_json::from_value(dead[0].clone()).unwrap();
    assert_eq!(record.source_queue, queues::CRITICAL);
    assert_eq!(record.original_message, body);
    assert!(record.error.contains("irrigate"));
}

#[tokio::test]
async fn test_failed_message_waits_for_visibility_timeout() {
    let harness = TestHarness::new();
    harness
        .queue
        .send_message(
            queues::HIGH,
            &json!({"id": "m-1", "priority": "high", "task_type": "sensor_reading", "payload": {}}),
        )
        .await
        .unwrap();

    let first = harness.processor.invoke(&drain_request()).await;
    assert_eq!(first.error_count, 1);
    assert_eq!(harness.queue.queue_length(queues::HIGH).await, 1);

    // Still leased
    let second = harness.processor.invoke(&drain_request()).await;
    assert_eq!(second.error_count, 0);

    harness.clock.advance(Duration::seconds(31));
    let third = harness.processor.invoke(&drain_request()).await;
    assert_eq!(third.error_count, 1);
    assert!(harness.queue.payloads(queues::DEAD_LETTER).await.is_empty());
}

#[tokio::test]
async fn test_redeliveries_count_towards_retry_budget() {
    let harness = TestHarness::new();
    harness
        .queue
        .send_message(
            queues::LOW,
            &json!({"id": "m-2", "priority": "low", "task_type": "sensor_reading", "payload": {}}),
        )
        .await
        .unwrap();

    // Deliveries one to three fail and are left for redelivery
    for _ in 0..3 {
        harness.processor.invoke(&drain_request()).await;
        harness.clock.advance(Duration::seconds(31));
    }
    assert_eq!(harness.queue.queue_length(queues::LOW).await, 1);

    // The fourth failure has three retries behind it
    harness.processor.invoke(&drain_request()).await;
    assert_eq!(harness.queue.queue_length(queues::LOW).await, 0);
    assert_eq!(harness.queue.payloads(queues::DEAD_LETTER).await.len(), 1);
}

#[tokio::test]
async fn test_malformed_payload_is_a_handler_failure() {
    let harness = TestHarness::new();
    harness
        .queue
        .send_message(queues::NORMAL, &json!({"garbage": true, "retry_count": 5}))
        .await
        .unwrap();

    let result = harness.processor.invoke(&drain_request()).await;

    assert!(result.success);
    assert!(result.errors[0].contains("Malformed task message"));
    assert_eq!(harness.queue.payloads(queues::DEAD_LETTER).await.len(), 1);
}

#[tokio::test]
async fn test_processed_messages_are_counted() {
    let harness = TestHarness::new();
    for i in 0..3 {
        harness
            .queue
            .send_message(
                queues::NORMAL,
                &reading_message(PriorityTier::Normal, &format!("sensor.{i}")),
            )
            .await
            .unwrap();
    }

    let result = harness.processor.invoke(&drain_request()).await;
    // Three messages plus the cleanup run
    assert_eq!(result.processed_count, 4);
    assert!(result
        .operations
        .iter()
        .any(|op| op == "Queue drain: 3 processed, 0 failed, 0 dead-lettered"));
}

#[tokio::test]
async fn test_each_tier_reads_one_batch_per_drain() {
    let harness = TestHarness::new();
    for i in 0..12 {
        harness
            .queue
            .send_message(
                queues::CRITICAL,
                &reading_message(PriorityTier::Critical, &format!("sensor.rack_{i}")),
            )
            .await
            .unwrap();
    }

    let first = harness.processor.invoke(&drain_request()).await;
    assert!(first
        .operations
        .iter()
        .any(|op| op == "Queue drain: 10 processed, 0 failed, 0 dead-lettered"));
    assert_eq!(harness.queue.queue_length(queues::CRITICAL).await, 2);
    assert_eq!(harness.datastore.sensor_readings().len(), 10);

    let second = harness.processor.invoke(&drain_request()).await;
    assert!(second
        .operations
        .iter()
        .any(|op| op == "Queue drain: 2 processed, 0 failed, 0 dead-lettered"));
    assert_eq!(harness.queue.queue_length(queues::CRITICAL).await, 0);
    assert_eq!(harness.datastore.sensor_readings().len(), 12);
}

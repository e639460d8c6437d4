//! Queue task messages and dead-letter records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority tiers, drained in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Critical,
    High,
    Normal,
    Low,
}

impl PriorityTier {
    /// Fixed drain order
    pub const DRAIN_ORDER: [PriorityTier; 4] = [
        PriorityTier::Critical,
        PriorityTier::High,
        PriorityTier::Normal,
        PriorityTier::Low,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler selector carried by a queued message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueTaskType {
    DeviceControl,
    SensorReading,
    ScheduleCheck,
    DeviceHealthCheck,
    Unknown(String),
}

impl QueueTaskType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DeviceControl => "device_control",
            Self::SensorReading => "sensor_reading",
            Self::ScheduleCheck => "schedule_check",
            Self::DeviceHealthCheck => "device_health_check",
            Self::Unknown(other) => other,
        }
    }
}

impl From<String> for QueueTaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "device_control" => Self::DeviceControl,
            "sensor_reading" => Self::SensorReading,
            "schedule_check" => Self::ScheduleCheck,
            "device_health_check" => Self::DeviceHealthCheck,
            _ => Self::Unknown(value),
        }
    }
}

impl From<QueueTaskType> for String {
    fn from(task_type: QueueTaskType) -> Self {
        task_type.as_str().to_string()
    }
}

impl fmt::Display for QueueTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of work placed on a priority queue.
///
/// Delivery is at-least-once: a handler may see the same message more than
/// once and must be idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    pub id: String,
    pub priority: PriorityTier,
    pub task_type: QueueTaskType,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub retry_count: u32,
}

impl TaskMessage {
    pub fn new(priority: PriorityTier, task_type: QueueTaskType, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            priority,
            task_type,
            payload,
            retry_count: 0,
        }
    }
}

/// A message removed from its tier after exhausting its retries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    /// Raw message body as it was read from the source queue
    pub original_message: serde_json::Value,
    pub source_queue: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drain_order() {
        let mut sorted = PriorityTier::DRAIN_ORDER.to_vec();
        sorted.sort();
        assert_eq!(sorted, PriorityTier::DRAIN_ORDER.to_vec());
        assert_eq!(PriorityTier::DRAIN_ORDER[0], PriorityTier::Critical);
    }

    #[test]
    fn test_message_parsing() {
        let message: TaskMessage = serde_json::from_value(json!({
            "id": "m-1",
            "priority": "critical",
            "task_type": "device_control",
            "payload": {"entity_id": "switch.heater_1"},
            "retry_count": 2
        }))
        .unwrap();

        assert_eq!(message.priority, PriorityTier::Critical);
        assert_eq!(message.task_type, QueueTaskType::DeviceControl);
        assert_eq!(message.retry_count, 2);
    }

    #[test]
    fn test_unknown_queue_task_type() {
        let message: TaskMessage = serde_json::from_value(json!({
            "id": "m-2",
            "priority": "low",
            "task_type": "reboot_farm"
        }))
        .unwrap();

        assert_eq!(message.task_type, QueueTaskType::Unknown("reboot_farm".to_string()));
        assert_eq!(message.retry_count, 0);
        assert!(message.payload.is_null());
    }
}

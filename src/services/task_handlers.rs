//! # Queue Task Handlers
//!
//! One handler per [`QueueTaskType`]. Messages are delivered at least once, so
//! every handler is an upsert or a re-derivable check and is safe to repeat.

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::SensorScheduleMonitor;
use crate::database::Datastore;
use crate::error::{ProcessorError, ProcessorResult};
use crate::gateway::DeviceGateway;
use crate::models::device::entity_domain;
use crate::models::{DeviceCommand, ProcessingResult, QueueTaskType, SensorReading, TaskMessage};

const DEFAULT_SERVICE: &str = "turn_on";

/// Entity-level control routed to the device gateway
#[derive(Debug, Deserialize)]
struct EntityControlPayload {
    entity_id: String,
    domain: Option<String>,
    #[serde(default = "default_service")]
    service: String,
    #[serde(default)]
    parameters: serde_json::Value,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShelfScopePayload {
    shelf_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TaskHandlers {
    datastore: Arc<dyn Datastore>,
    gateway: Option<Arc<dyn DeviceGateway>>,
    monitor: SensorScheduleMonitor,
}

impl TaskHandlers {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        gateway: Option<Arc<dyn DeviceGateway>>,
        monitor: SensorScheduleMonitor,
    ) -> Self {
        Self {
            datastore,
            gateway,
            monitor,
        }
    }

    /// Run the handler for `message`, returning a short description of what it did
    pub async fn handle(&self, message: &TaskMessage) -> ProcessorResult<String> {
        debug!(
            message_id = %message.id,
            task_type = %message.task_type,
            "Handling queued task"
        );

        match &message.task_type {
            QueueTaskType::DeviceControl => self.device_control(&message.payload).await,
            QueueTaskType::SensorReading => self.sensor_reading(&message.payload).await,
            QueueTaskType::ScheduleCheck => self.schedule_check(&message.payload).await,
            QueueTaskType::DeviceHealthCheck => self.device_health_check(&message.payload).await,
            QueueTaskType::Unknown(other) => Err(ProcessorError::HandlerError(format!(
                "Unknown task type: {other}"
            ))),
        }
    }

    async fn device_control(&self, payload: &serde_json::Value) -> ProcessorResult<String> {
        if payload.get("entity_id").is_some() {
            let control: EntityControlPayload = serde_json::from_value(payload.clone())?;
            let gateway = self.gateway.as_ref().ok_or_else(|| {
                ProcessorError::HandlerError(format!(
                    "No device gateway configured to control {}",
                    control.entity_id
                ))
            })?;

            let domain = control
                .domain
                .clone()
                .unwrap_or_else(|| entity_domain(&control.entity_id).to_string());
            gateway
                .execute(&control.entity_id, &domain, &control.service, &control.parameters)
                .await?;

            return Ok(format!("{domain}.{} on {}", control.service, control.entity_id));
        }

        let command: DeviceCommand = serde_json::from_value(payload.clone())?;
        self.datastore.execute_device_control(&command).await?;
        Ok(format!(
            "{} {} on shelf {}",
            command.device_type, command.action, command.shelf_id
        ))
    }

    async fn sensor_reading(&self, payload: &serde_json::Value) -> ProcessorResult<String> {
        let reading: SensorReading = serde_json::from_value(payload.clone())?;
        self.datastore.record_sensor_reading(&reading).await?;
        Ok(format!("reading from {}", reading.entity_id))
    }

    async fn schedule_check(&self, payload: &serde_json::Value) -> ProcessorResult<String> {
        let scope = shelf_scope(payload)?;
        let mut scratch = ProcessingResult::new();
        let alerts = self
            .monitor
            .run_schedule_pass(scope.shelf_ids.as_deref(), &mut scratch)
            .await?;
        fail_on_errors(&scratch)?;
        Ok(format!("schedule check raised {alerts} alerts"))
    }

    async fn device_health_check(&self, payload: &serde_json::Value) -> ProcessorResult<String> {
        let scope = shelf_scope(payload)?;
        let mut scratch = ProcessingResult::new();
        let alerts = self
            .monitor
            .run_staleness_pass(scope.shelf_ids.as_deref(), &mut scratch)
            .await?;
        fail_on_errors(&scratch)?;
        Ok(format!("device health check raised {alerts} alerts"))
    }
}

fn shelf_scope(payload: &serde_json::Value) -> ProcessorResult<ShelfScopePayload> {
    if payload.is_null() {
        return Ok(ShelfScopePayload::default());
    }
    Ok(serde_json::from_value(payload.clone())?)
}

/// A partially failed pass fails the message so it is retried
fn fail_on_errors(scratch: &ProcessingResult) -> ProcessorResult<()> {
    if scratch.errors.is_empty() {
        Ok(())
    } else {
        Err(ProcessorError::HandlerError(scratch.errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitoringConfig;
    use crate::database::InMemoryDatastore;
    use crate::gateway::InMemoryDeviceGateway;
    use crate::models::{DeviceType, PriorityTier};
    use serde_json::json;

    fn handlers(
        datastore: Arc<InMemoryDatastore>,
        gateway: Option<Arc<dyn DeviceGateway>>,
    ) -> TaskHandlers {
        let monitor = SensorScheduleMonitor::new(datastore.clone(), MonitoringConfig::default());
        TaskHandlers::new(datastore, gateway, monitor)
    }

    #[tokio::test]
    async fn test_entity_control_goes_to_gateway() {
        let datastore = Arc::new(InMemoryDatastore::new());
        let gateway = Arc::new(InMemoryDeviceGateway::new());
        let handlers = handlers(datastore, Some(gateway.clone() as Arc<dyn DeviceGateway>));

        let message = TaskMessage::new(
            PriorityTier::Critical,
            QueueTaskType::DeviceControl,
            json!({"entity_id": "switch.heater_1", "parameters": {"brightness": 10}}),
        );
        handlers.handle(&message).await.unwrap();

        let calls = gateway.executed();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].domain, "switch");
        assert_eq!(calls[0].service, "turn_on");
        assert_eq!(calls[0].parameters, json!({"brightness": 10}));
    }

    #[tokio::test]
    async fn test_entity_control_without_gateway_fails() {
        let handlers = handlers(Arc::new(InMemoryDatastore::new()), None);
        let message = TaskMessage::new(
            PriorityTier::High,
            QueueTaskType::DeviceControl,
            json!({"entity_id": "fan.exhaust"}),
        );
        let err = handlers.handle(&message).await.unwrap_err();
        assert!(matches!(err, ProcessorError::HandlerError(_)));
    }

    #[tokio::test]
    async fn test_shelf_control_goes_to_datastore() {
        let datastore = Arc::new(InMemoryDatastore::new());
        let handlers = handlers(datastore.clone(), None);

        let message = TaskMessage::new(
            PriorityTier::Normal,
            QueueTaskType::DeviceControl,
            json!({"shelf_id": "S1", "device_type": "fan", "action": "turn_off"}),
        );
        handlers.handle(&message).await.unwrap();

        let commands = datastore.control_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].device_type, DeviceType::Fan);
    }

    #[tokio::test]
    async fn test_malformed_reading_fails() {
        let handlers = handlers(Arc::new(InMemoryDatastore::new()), None);
        let message = TaskMessage::new(
            PriorityTier::Low,
            QueueTaskType::SensorReading,
            json!({"temperature": 21.0}),
        );
        assert!(handlers.handle(&message).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_task_type_fails() {
        let handlers = handlers(Arc::new(InMemoryDatastore::new()), None);
        let message = TaskMessage::new(
            PriorityTier::Low,
            QueueTaskType::Unknown("irrigate".to_string()),
            json!({}),
        );
        let err = handlers.handle(&message).await.unwrap_err();
        assert!(err.to_string().contains("irrigate"));
    }

    #[tokio::test]
    async fn test_schedule_check_failure_propagates() {
        let datastore = Arc::new(InMemoryDatastore::new());
        datastore.fail_operation("active_schedule_summaries");
        let handlers = handlers(datastore, None);

        let message = TaskMessage::new(PriorityTier::Normal, QueueTaskType::ScheduleCheck, json!(null));
        assert!(handlers.handle(&message).await.is_err());
    }
}

//! # Environmental Control Engine
//!
//! Stateless threshold control: every evaluation re-derives commands from the
//! latest sensor reading only. There is no deadband and no "turn off when back
//! in range" logic, so a reading oscillating around a bound yields a command on
//! every invocation that sees it outside the range.

use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::database::Datastore;
use crate::error::ProcessorResult;
use crate::logging::log_control_decision;
use crate::models::{
    ActiveScheduleSummary, DeviceCommand, DeviceType, ProcessingResult, SensorSummary,
};

#[derive(Debug, Clone)]
pub struct EnvironmentalControlEngine {
    datastore: Arc<dyn Datastore>,
}

impl EnvironmentalControlEngine {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    /// Evaluate every active schedule and dispatch the resulting commands.
    ///
    /// Returns the commands that were dispatched successfully. A failed
    /// dispatch is recorded on `result` and evaluation continues.
    pub async fn evaluate(
        &self,
        shelf_ids: Option<&[String]>,
        result: &mut ProcessingResult,
    ) -> ProcessorResult<Vec<DeviceCommand>> {
        let schedules = self.datastore.active_schedule_summaries(shelf_ids).await?;
        let sensors = self.datastore.sensor_summaries(shelf_ids).await?;

        let mut dispatched = Vec::new();
        let mut evaluated = 0usize;

        for schedule in &schedules {
            let Some(sensor) = reporting_sensor_for(schedule, &sensors) else {
                debug!(
                    shelf_id = %schedule.shelf_id,
                    schedule_id = %schedule.schedule_id,
                    "No sensor reported this hour, skipping control"
                );
                continue;
            };

            evaluated += 1;
            result.record_processed(1);

            for command in decide_commands(schedule, sensor) {
                match self.datastore.execute_device_control(&command).await {
                    Ok(_) => {
                        log_control_decision(
                            &command.shelf_id,
                            command.device_type.as_str(),
                            command.action.as_str(),
                            command.parameters["reading"].as_f64().unwrap_or_default(),
                            command.parameters["target"].as_f64().unwrap_or_default(),
                        );
                        dispatched.push(command);
                    }
                    Err(e) => result.record_error(format!(
                        "Failed to dispatch {} {} for shelf {}: {e}",
                        command.device_type, command.action, command.shelf_id
                    )),
                }
            }
        }

        result.record_operation(format!(
            "Environmental control: {evaluated} schedules evaluated, {} commands issued",
            dispatched.len()
        ));
        Ok(dispatched)
    }
}

/// First sensor on the schedule's shelf with at least one reading this hour
pub fn reporting_sensor_for<'a>(
    schedule: &ActiveScheduleSummary,
    sensors: &'a [SensorSummary],
) -> Option<&'a SensorSummary> {
    sensors
        .iter()
        .find(|s| s.shelf_id == schedule.shelf_id && s.has_recent_readings())
}

/// Commands for one schedule: at most one temperature and one humidity command.
pub fn decide_commands(
    schedule: &ActiveScheduleSummary,
    sensor: &SensorSummary,
) -> Vec<DeviceCommand> {
    let mut commands = Vec::with_capacity(2);

    if let Some(temperature) = sensor.latest_temperature {
        if let Some(command) = threshold_command(
            schedule,
            "temperature",
            temperature,
            schedule.target_temperature_min,
            schedule.target_temperature_max,
            DeviceType::Heater,
            DeviceType::Fan,
        ) {
            commands.push(command);
        }
    }

    if let Some(humidity) = sensor.latest_humidity {
        if let Some(command) = threshold_command(
            schedule,
            "humidity",
            humidity,
            schedule.target_humidity_min,
            schedule.target_humidity_max,
            DeviceType::Humidifier,
            DeviceType::Dehumidifier,
        ) {
            commands.push(command);
        }
    }

    commands
}

fn threshold_command(
    schedule: &ActiveScheduleSummary,
    dimension: &str,
    reading: f64,
    min: Option<f64>,
    max: Option<f64>,
    below: DeviceType,
    above: DeviceType,
) -> Option<DeviceCommand> {
    let (device_type, reason, target) = match (min, max) {
        (Some(min), _) if reading < min => (below, format!("{dimension}_below_min"), min),
        (_, Some(max)) if reading > max => (above, format!("{dimension}_above_max"), max),
        _ => return None,
    };

    Some(DeviceCommand::turn_on(
        schedule.shelf_id.clone(),
        device_type,
        json!({
            "reason": reason,
            "reading": reading,
            "target": target,
            "schedule_id": schedule.schedule_id,
        }),
    ))
}

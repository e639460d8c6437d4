//! # Sensor & Schedule Monitor
//!
//! Two independent, read-only, alert-only passes over the summary views.
//!
//! The staleness pass does not alert on `readings_last_hour == 0` alone:
//! each candidate is confirmed with the datastore's responsiveness check
//! first, so bursty sensors that merely skipped the current hour are not
//! reported offline.

use std::sync::Arc;
use tracing::debug;

use crate::config::MonitoringConfig;
use crate::database::Datastore;
use crate::error::ProcessorResult;
use crate::logging::log_alert_created;
use crate::models::{ActiveScheduleSummary, AlertType, NewAlert, ProcessingResult, SensorSummary};

#[derive(Debug, Clone)]
pub struct SensorScheduleMonitor {
    datastore: Arc<dyn Datastore>,
    config: MonitoringConfig,
}

impl SensorScheduleMonitor {
    pub fn new(datastore: Arc<dyn Datastore>, config: MonitoringConfig) -> Self {
        Self { datastore, config }
    }

    /// Raise `device_offline` alerts for sensors that are silent and unresponsive.
    ///
    /// Returns the number of alerts created. Per-sensor failures are recorded
    /// on `result`; only a failed summary read fails the pass.
    pub async fn run_staleness_pass(
        &self,
        shelf_ids: Option<&[String]>,
        result: &mut ProcessingResult,
    ) -> ProcessorResult<usize> {
        let candidates = self.datastore.stale_sensor_summaries(shelf_ids).await?;
        let mut alerts_created = 0;

        for sensor in &candidates {
            result.record_processed(1);

            let responding = match self
                .datastore
                .check_device_responsiveness(
                    &sensor.entity_id,
                    self.config.responsiveness_window_minutes,
                )
                .await
            {
                Ok(responding) => responding,
                Err(e) => {
                    result.record_error(format!(
                        "Responsiveness check failed for {}: {e}",
                        sensor.entity_id
                    ));
                    continue;
                }
            };

            if responding {
                debug!(
                    entity_id = %sensor.entity_id,
                    "No reading this hour but sensor is responsive, skipping"
                );
                continue;
            }

            let alert = self.offline_alert(sensor);
            if self.create_alert(alert, result).await {
                alerts_created += 1;
            }
        }

        result.record_operation(format!(
            "Sensor monitoring: {} candidates checked, {alerts_created} offline alerts created",
            candidates.len()
        ));
        Ok(alerts_created)
    }

    /// Raise `harvest_ready` and `schedule_overdue` alerts for active schedules.
    ///
    /// Both conditions are evaluated independently, so one schedule may yield
    /// two alerts.
    pub async fn run_schedule_pass(
        &self,
        shelf_ids: Option<&[String]>,
        result: &mut ProcessingResult,
    ) -> ProcessorResult<usize> {
        let schedules = self.datastore.active_schedule_summaries(shelf_ids).await?;
        let mut alerts_created = 0;

        for schedule in &schedules {
            result.record_processed(1);

            for alert in schedule_alerts(schedule, self.config.harvest_ready_percentage) {
                if self.create_alert(alert, result).await {
                    alerts_created += 1;
                }
            }
        }

        result.record_operation(format!(
            "Schedule automation: {} schedules evaluated, {alerts_created} alerts created",
            schedules.len()
        ));
        Ok(alerts_created)
    }

    fn offline_alert(&self, sensor: &SensorSummary) -> NewAlert {
        NewAlert::new(
            sensor.shelf_id.clone(),
            None,
            AlertType::DeviceOffline,
            format!(
                "Sensor {} at {} has not reported in the last {} minutes",
                sensor.entity_id, sensor.full_path, self.config.responsiveness_window_minutes
            ),
        )
    }

    async fn create_alert(&self, alert: NewAlert, result: &mut ProcessingResult) -> bool {
        match self.datastore.create_alert(&alert).await {
            Ok(()) => {
                log_alert_created(
                    &alert.shelf_id,
                    alert.alert_type.as_str(),
                    alert.severity.as_str(),
                    &alert.message,
                );
                true
            }
            Err(e) => {
                result.record_error(format!(
                    "Failed to create {} alert for shelf {}: {e}",
                    alert.alert_type, alert.shelf_id
                ));
                false
            }
        }
    }
}

/// Alerts a schedule qualifies for, harvest first
pub fn schedule_alerts(schedule: &ActiveScheduleSummary, harvest_threshold: f64) -> Vec<NewAlert> {
    let mut alerts = Vec::new();

    if schedule.completion_percentage >= harvest_threshold {
        alerts.push(NewAlert::new(
            schedule.shelf_id.clone(),
            Some(schedule.schedule_id.clone()),
            AlertType::HarvestReady,
            format!(
                "{} on {} is ready for harvest ({}% complete)",
                schedule.species_name, schedule.full_path, schedule.completion_percentage
            ),
        ));
    }

    if schedule.days_remaining < 0 {
        alerts.push(NewAlert::new(
            schedule.shelf_id.clone(),
            Some(schedule.schedule_id.clone()),
            AlertType::ScheduleOverdue,
            format!(
                "{} on {} is {} days overdue",
                schedule.species_name,
                schedule.full_path,
                schedule.days_remaining.unsigned_abs()
            ),
        ));
    }

    alerts
}

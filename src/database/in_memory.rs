//! In-memory [`Datastore`] for tests and local runs.
//!
//! Seed the summary views with the `seed_*` / `set_*` helpers, inspect writes
//! with the accessor methods, and inject failures per operation name with
//! [`InMemoryDatastore::fail_operation`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use super::Datastore;
use crate::error::{ProcessorError, ProcessorResult};
use crate::models::{
    ActiveScheduleSummary, DeviceCommand, DiscoveredDevice, EntityState, NewAlert,
    PerformanceLogEntry, SensorReading, SensorSummary, TableMutationStats,
};

#[derive(Debug, Default)]
struct State {
    sensor_summaries: Vec<SensorSummary>,
    schedule_summaries: Vec<ActiveScheduleSummary>,
    responsive_entities: HashSet<String>,
    mutation_stats: HashMap<String, TableMutationStats>,

    alerts: Vec<NewAlert>,
    device_states: HashMap<String, EntityState>,
    discovered_devices: HashMap<String, DiscoveredDevice>,
    control_commands: Vec<DeviceCommand>,
    sensor_readings: HashMap<(String, DateTime<Utc>), SensorReading>,
    performance_logs: Vec<PerformanceLogEntry>,
    cleanup_runs: Vec<u32>,
    cleanup_removes: u64,
    refresh_count: usize,

    failing_operations: HashSet<String>,
    failing_control_shelves: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    state: Mutex<State>,
}

fn matches_shelf(shelf_ids: Option<&[String]>, shelf_id: &str) -> bool {
    shelf_ids.map_or(true, |ids| ids.iter().any(|id| id == shelf_id))
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_sensor_summary(&self, summary: SensorSummary) {
        self.state.lock().sensor_summaries.push(summary);
    }

    pub fn seed_schedule_summary(&self, summary: ActiveScheduleSummary) {
        self.state.lock().schedule_summaries.push(summary);
    }

    /// Mark an entity as having reported within any responsiveness window
    pub fn set_responsive(&self, entity_id: &str, responsive: bool) {
        let mut state = self.state.lock();
        if responsive {
            state.responsive_entities.insert(entity_id.to_string());
        } else {
            state.responsive_entities.remove(entity_id);
        }
    }

    pub fn set_mutation_stats(&self, table: &str, inserts: i64, updates: i64, deletes: i64) {
        self.state.lock().mutation_stats.insert(
            table.to_string(),
            TableMutationStats {
                table_name: table.to_string(),
                inserts,
                updates,
                deletes,
            },
        );
    }

    /// Rows the next cleanup run reports as removed
    pub fn set_cleanup_removes(&self, count: u64) {
        self.state.lock().cleanup_removes = count;
    }

    /// Make the named trait operation fail with a database error
    pub fn fail_operation(&self, operation: &str) {
        self.state
            .lock()
            .failing_operations
            .insert(operation.to_string());
    }

    /// Make device control fail for commands targeting `shelf_id` only
    pub fn fail_device_control_for(&self, shelf_id: &str) {
        self.state
            .lock()
            .failing_control_shelves
            .insert(shelf_id.to_string());
    }

    pub fn alerts(&self) -> Vec<NewAlert> {
        self.state.lock().alerts.clone()
    }

    pub fn device_states(&self) -> HashMap<String, EntityState> {
        self.state.lock().device_states.clone()
    }

    pub fn discovered_devices(&self) -> HashMap<String, DiscoveredDevice> {
        self.state.lock().discovered_devices.clone()
    }

    pub fn control_commands(&self) -> Vec<DeviceCommand> {
        self.state.lock().control_commands.clone()
    }

    pub fn sensor_readings(&self) -> Vec<SensorReading> {
        let mut readings: Vec<SensorReading> =
            self.state.lock().sensor_readings.values().cloned().collect();
        readings.sort_by(|a, b| (&a.entity_id, a.recorded_at).cmp(&(&b.entity_id, b.recorded_at)));
        readings
    }

    pub fn performance_logs(&self) -> Vec<PerformanceLogEntry> {
        self.state.lock().performance_logs.clone()
    }

    pub fn cleanup_runs(&self) -> Vec<u32> {
        self.state.lock().cleanup_runs.clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.state.lock().refresh_count
    }

    fn check(&self, operation: &str) -> ProcessorResult<()> {
        if self.state.lock().failing_operations.contains(operation) {
            return Err(ProcessorError::DatabaseError(format!(
                "{operation} failed: connection reset"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>> {
        self.check("sensor_summaries")?;
        Ok(self
            .state
            .lock()
            .sensor_summaries
            .iter()
            .filter(|s| matches_shelf(shelf_ids, &s.shelf_id))
            .cloned()
            .collect())
    }

    async fn stale_sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>> {
        self.check("stale_sensor_summaries")?;
        Ok(self
            .state
            .lock()
            .sensor_summaries
            .iter()
            .filter(|s| !s.has_recent_readings() && matches_shelf(shelf_ids, &s.shelf_id))
            .cloned()
            .collect())
    }

    async fn active_schedule_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<ActiveScheduleSummary>> {
        self.check("active_schedule_summaries")?;
        Ok(self
            .state
            .lock()
            .schedule_summaries
            .iter()
            .filter(|s| matches_shelf(shelf_ids, &s.shelf_id))
            .cloned()
            .collect())
    }

    async fn create_alert(&self, alert: &NewAlert) -> ProcessorResult<()> {
        self.check("create_alert")?;
        self.state.lock().alerts.push(alert.clone());
        Ok(())
    }

    async fn check_device_responsiveness(
        &self,
        entity_id: &str,
        _window_minutes: u32,
    ) -> ProcessorResult<bool> {
        self.check("check_device_responsiveness")?;
        Ok(self.state.lock().responsive_entities.contains(entity_id))
    }

    async fn table_mutation_stats(
        &self,
        tables: &[String],
    ) -> ProcessorResult<Vec<TableMutationStats>> {
        self.check("table_mutation_stats")?;
        let state = self.state.lock();
        Ok(tables
            .iter()
            .filter_map(|t| state.mutation_stats.get(t).cloned())
            .collect())
    }

    async fn refresh_summary_views(&self) -> ProcessorResult<()> {
        self.check("refresh_summary_views")?;
        self.state.lock().refresh_count += 1;
        Ok(())
    }

    async fn upsert_device_state(&self, entity: &EntityState) -> ProcessorResult<()> {
        self.check("upsert_device_state")?;
        self.state
            .lock()
            .device_states
            .insert(entity.entity_id.clone(), entity.clone());
        Ok(())
    }

    async fn upsert_discovered_device(&self, device: &DiscoveredDevice) -> ProcessorResult<()> {
        self.check("upsert_discovered_device")?;
        self.state
            .lock()
            .discovered_devices
            .insert(device.entity_id.clone(), device.clone());
        Ok(())
    }

    async fn execute_device_control(
        &self,
        command: &DeviceCommand,
    ) -> ProcessorResult<serde_json::Value> {
        self.check("execute_device_control")?;
        let mut state = self.state.lock();
        if state.failing_control_shelves.contains(&command.shelf_id) {
            return Err(ProcessorError::DatabaseError(format!(
                "execute_device_control failed for shelf {}: device unreachable",
                command.shelf_id
            )));
        }
        state.control_commands.push(command.clone());
        drop(state);
        Ok(serde_json::json!({
            "shelf_id": command.shelf_id,
            "device_type": command.device_type,
            "action": command.action,
            "success": true
        }))
    }

    async fn record_sensor_reading(&self, reading: &SensorReading) -> ProcessorResult<()> {
        self.check("record_sensor_reading")?;
        self.state.lock().sensor_readings.insert(
            (reading.entity_id.clone(), reading.recorded_at),
            reading.clone(),
        );
        Ok(())
    }

    async fn cleanup_old_records(&self, retention_days: u32) -> ProcessorResult<u64> {
        self.check("cleanup_old_records")?;
        let mut state = self.state.lock();
        state.cleanup_runs.push(retention_days);
        Ok(state.cleanup_removes)
    }

    async fn append_performance_log(&self, entry: &PerformanceLogEntry) -> ProcessorResult<()> {
        self.check("append_performance_log")?;
        self.state.lock().performance_logs.push(entry.clone());
        Ok(())
    }

    async fn health_check(&self) -> ProcessorResult<bool> {
        self.check("health_check")?;
        Ok(true)
    }
}

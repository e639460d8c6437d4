//! The datastore surface the processor consumes.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ProcessorResult;
use crate::models::{
    ActiveScheduleSummary, DeviceCommand, DiscoveredDevice, EntityState, NewAlert,
    PerformanceLogEntry, SensorReading, SensorSummary, TableMutationStats,
};

/// Reads of the derived summary views plus the write and RPC calls made by
/// the processor's components.
///
/// Every write is an upsert or an append: handlers may run more than once
/// for the same message and must not double-apply.
#[async_trait]
pub trait Datastore: Send + Sync + Debug {
    /// All sensor summaries, optionally restricted to shelves
    async fn sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>>;

    /// Sensor summaries with no reading in the current hour
    async fn stale_sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>>;

    async fn active_schedule_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<ActiveScheduleSummary>>;

    async fn create_alert(&self, alert: &NewAlert) -> ProcessorResult<()>;

    /// Whether the entity has reported within the last `window_minutes`
    async fn check_device_responsiveness(
        &self,
        entity_id: &str,
        window_minutes: u32,
    ) -> ProcessorResult<bool>;

    /// Cumulative insert/update/delete counters of the given tables
    async fn table_mutation_stats(
        &self,
        tables: &[String],
    ) -> ProcessorResult<Vec<TableMutationStats>>;

    /// Recompute every derived summary view
    async fn refresh_summary_views(&self) -> ProcessorResult<()>;

    async fn upsert_device_state(&self, state: &EntityState) -> ProcessorResult<()>;

    async fn upsert_discovered_device(&self, device: &DiscoveredDevice) -> ProcessorResult<()>;

    /// Immediate shelf-level device control; returns the RPC's report
    async fn execute_device_control(
        &self,
        command: &DeviceCommand,
    ) -> ProcessorResult<serde_json::Value>;

    /// Upsert keyed by entity and timestamp
    async fn record_sensor_reading(&self, reading: &SensorReading) -> ProcessorResult<()>;

    /// Remove records older than the retention window, returning the row count
    async fn cleanup_old_records(&self, retention_days: u32) -> ProcessorResult<u64>;

    async fn append_performance_log(&self, entry: &PerformanceLogEntry) -> ProcessorResult<()>;

    async fn health_check(&self) -> ProcessorResult<bool>;
}

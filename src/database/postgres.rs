//! # PostgreSQL Datastore
//!
//! [`Datastore`] over a sqlx pool. Summary reads go to the `sensor_summary`
//! and `active_schedule_summary` views; everything that changes state goes
//! through a database function so the upsert semantics live next to the
//! schema.
//!
//! | Operation | SQL |
//! |---|---|
//! | responsiveness | `check_device_responsiveness(entity_id, window_minutes)` |
//! | view refresh | `refresh_summary_views()` |
//! | device state | `upsert_device_state(...)` |
//! | discovery | `upsert_discovered_device(...)` |
//! | shelf control | `execute_immediate_device_control(...)` |
//! | sensor ingest | `upsert_sensor_reading(...)` |
//! | cleanup | `cleanup_old_records(retention_days)` |
//! | performance log | `log_performance_metrics(...)` |

use async_trait::async_trait;
use sqlx::PgPool;

use super::Datastore;
use crate::error::ProcessorResult;
use crate::models::{
    ActiveScheduleSummary, DeviceCommand, DiscoveredDevice, EntityState, NewAlert,
    PerformanceLogEntry, SensorReading, SensorSummary, TableMutationStats,
};

const SENSOR_SUMMARY_COLUMNS: &str = r#"
    device_assignment_id::text AS device_assignment_id,
    shelf_id::text AS shelf_id,
    entity_id::text AS entity_id,
    latest_temperature::float8 AS latest_temperature,
    latest_humidity::float8 AS latest_humidity,
    COALESCE(readings_last_hour, 0)::int8 AS readings_last_hour,
    COALESCE(full_path, '')::text AS full_path
"#;

#[derive(Debug, Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn shelf_filter(shelf_ids: Option<&[String]>) -> Option<Vec<String>> {
        shelf_ids.map(<[String]>::to_vec)
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>> {
        let sql = format!(
            "SELECT {SENSOR_SUMMARY_COLUMNS} FROM sensor_summary \
             WHERE ($1::text[] IS NULL OR shelf_id::text = ANY($1)) \
             ORDER BY shelf_id, entity_id"
        );
        let rows = sqlx::query_as::<_, SensorSummary>(&sql)
            .bind(Self::shelf_filter(shelf_ids))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn stale_sensor_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<SensorSummary>> {
        let sql = format!(
            "SELECT {SENSOR_SUMMARY_COLUMNS} FROM sensor_summary \
             WHERE COALESCE(readings_last_hour, 0) < 1 \
               AND ($1::text[] IS NULL OR shelf_id::text = ANY($1)) \
             ORDER BY shelf_id, entity_id"
        );
        let rows = sqlx::query_as::<_, SensorSummary>(&sql)
            .bind(Self::shelf_filter(shelf_ids))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn active_schedule_summaries(
        &self,
        shelf_ids: Option<&[String]>,
    ) -> ProcessorResult<Vec<ActiveScheduleSummary>> {
        let rows = sqlx::query_as::<_, ActiveScheduleSummary>(
            r#"
            SELECT
                schedule_id::text AS schedule_id,
                shelf_id::text AS shelf_id,
                COALESCE(species_name, '')::text AS species_name,
                COALESCE(completion_percentage, 0)::float8 AS completion_percentage,
                COALESCE(days_remaining, 0)::int4 AS days_remaining,
                target_temperature_min::float8 AS target_temperature_min,
                target_temperature_max::float8 AS target_temperature_max,
                target_humidity_min::float8 AS target_humidity_min,
                target_humidity_max::float8 AS target_humidity_max,
                COALESCE(full_path, '')::text AS full_path
            FROM active_schedule_summary
            WHERE ($1::text[] IS NULL OR shelf_id::text = ANY($1))
            ORDER BY shelf_id, schedule_id
            "#,
        )
        .bind(Self::shelf_filter(shelf_ids))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_alert(&self, alert: &NewAlert) -> ProcessorResult<()> {
        sqlx::query(
            r#"
            INSERT INTO alerts (shelf_id, schedule_id, alert_type, severity, message, is_acknowledged)
            VALUES ($1::uuid, $2::uuid, $3, $4, $5, $6)
            "#,
        )
        .bind(&alert.shelf_id)
        .bind(&alert.schedule_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(alert.acknowledged)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn check_device_responsiveness(
        &self,
        entity_id: &str,
        window_minutes: u32,
    ) -> ProcessorResult<bool> {
        let responding: Option<bool> =
            sqlx::query_scalar("SELECT check_device_responsiveness($1, $2)")
                .bind(entity_id)
                .bind(i32::try_from(window_minutes).unwrap_or(i32::MAX))
                .fetch_one(&self.pool)
                .await?;
        Ok(responding.unwrap_or(false))
    }

    async fn table_mutation_stats(
        &self,
        tables: &[String],
    ) -> ProcessorResult<Vec<TableMutationStats>> {
        let rows = sqlx::query_as::<_, TableMutationStats>(
            r#"
            SELECT
                relname::text AS table_name,
                n_tup_ins::int8 AS inserts,
                n_tup_upd::int8 AS updates,
                n_tup_del::int8 AS deletes
            FROM pg_stat_user_tables
            WHERE relname = ANY($1)
            ORDER BY relname
            "#,
        )
        .bind(tables)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn refresh_summary_views(&self) -> ProcessorResult<()> {
        sqlx::query("SELECT refresh_summary_views()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_device_state(&self, state: &EntityState) -> ProcessorResult<()> {
        sqlx::query(
            "SELECT upsert_device_state($1, $2, $3::jsonb, $4::timestamptz, $5::timestamptz)",
        )
        .bind(&state.entity_id)
        .bind(&state.state)
        .bind(&state.attributes)
        .bind(&state.last_changed)
        .bind(&state.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_discovered_device(&self, device: &DiscoveredDevice) -> ProcessorResult<()> {
        sqlx::query("SELECT upsert_discovered_device($1, $2, $3, $4)")
            .bind(&device.entity_id)
            .bind(&device.domain)
            .bind(&device.friendly_name)
            .bind(&device.state)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn execute_device_control(
        &self,
        command: &DeviceCommand,
    ) -> ProcessorResult<serde_json::Value> {
        let report: Option<serde_json::Value> = sqlx::query_scalar(
            "SELECT to_jsonb(execute_immediate_device_control($1::uuid, $2, $3, $4::jsonb))",
        )
        .bind(&command.shelf_id)
        .bind(command.device_type.as_str())
        .bind(command.action.as_str())
        .bind(&command.parameters)
        .fetch_one(&self.pool)
        .await?;
        Ok(report.unwrap_or(serde_json::Value::Null))
    }

    async fn record_sensor_reading(&self, reading: &SensorReading) -> ProcessorResult<()> {
        sqlx::query("SELECT upsert_sensor_reading($1, $2, $3, $4)")
            .bind(&reading.entity_id)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.recorded_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cleanup_old_records(&self, retention_days: u32) -> ProcessorResult<u64> {
        let removed: Option<i64> = sqlx::query_scalar("SELECT cleanup_old_records($1)::int8")
            .bind(i32::try_from(retention_days).unwrap_or(i32::MAX))
            .fetch_one(&self.pool)
            .await?;
        Ok(removed.unwrap_or(0).max(0) as u64)
    }

    async fn append_performance_log(&self, entry: &PerformanceLogEntry) -> ProcessorResult<()> {
        let context = serde_json::to_value(&entry.context)?;
        sqlx::query("SELECT log_performance_metrics($1, $2, $3, $4, $5, $6::jsonb)")
            .bind(&entry.function_name)
            .bind(i64::try_from(entry.processed_count).unwrap_or(i64::MAX))
            .bind(i64::try_from(entry.success_count).unwrap_or(i64::MAX))
            .bind(i64::try_from(entry.error_count).unwrap_or(i64::MAX))
            .bind(entry.processing_time_ms)
            .bind(context)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> ProcessorResult<bool> {
        let health: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(health == 1)
    }
}

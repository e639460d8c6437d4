//! Read-only rows produced by the datastore's derived summary views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of the `sensor_summary` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SensorSummary {
    pub device_assignment_id: String,
    pub shelf_id: String,
    pub entity_id: String,
    pub latest_temperature: Option<f64>,
    pub latest_humidity: Option<f64>,
    pub readings_last_hour: i64,
    pub full_path: String,
}

impl SensorSummary {
    pub fn has_recent_readings(&self) -> bool {
        self.readings_last_hour >= 1
    }
}

/// Row of the `active_schedule_summary` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActiveScheduleSummary {
    pub schedule_id: String,
    pub shelf_id: String,
    pub species_name: String,
    pub completion_percentage: f64,
    pub days_remaining: i32,
    pub target_temperature_min: Option<f64>,
    pub target_temperature_max: Option<f64>,
    pub target_humidity_min: Option<f64>,
    pub target_humidity_max: Option<f64>,
    pub full_path: String,
}

/// Sensor reading ingested from the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub entity_id: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Cumulative mutation counters of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TableMutationStats {
    pub table_name: String,
    pub inserts: i64,
    pub updates: i64,
    pub deletes: i64,
}

impl TableMutationStats {
    pub fn total(&self) -> u64 {
        [self.inserts, self.updates, self.deletes]
            .iter()
            .map(|v| (*v).max(0) as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_readings() {
        let mut summary = SensorSummary {
            device_assignment_id: "da-1".to_string(),
            shelf_id: "S1".to_string(),
            entity_id: "sensor.shelf_1".to_string(),
            latest_temperature: Some(21.0),
            latest_humidity: None,
            readings_last_hour: 0,
            full_path: "Farm/Row A/Rack 1/Shelf 1".to_string(),
        };
        assert!(!summary.has_recent_readings());
        summary.readings_last_hour = 1;
        assert!(summary.has_recent_readings());
    }

    #[test]
    fn test_mutation_total_ignores_negative_counters() {
        let stats = TableMutationStats {
            table_name: "schedules".to_string(),
            inserts: 10,
            updates: 5,
            deletes: -1,
        };
        assert_eq!(stats.total(), 15);
    }
}

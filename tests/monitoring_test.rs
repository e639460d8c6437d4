//! Sensor staleness and schedule alerts through the processor.

mod common;

use common::{schedule, sensor, TestHarness};
use farm_automation::models::{AlertSeverity, AlertType};
use serde_json::json;

#[tokio::test]
async fn test_responsive_sensor_is_not_reported_offline() {
    let harness = TestHarness::new();
    harness
        .datastore
        .seed_sensor_summary(sensor("S1", "sensor.bursty", Some(21.0), None, 0));
    harness.datastore.set_responsive("sensor.bursty", true);

    let result = harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring"}))
        .await;

    assert!(result.success);
    assert_eq!(result.processed_count, 1);
    assert!(harness.datastore.alerts().is_empty());
}

#[tokio::test]
async fn test_unresponsive_sensor_raises_offline_alert() {
    let harness = TestHarness::new();
    harness
        .datastore
        .seed_sensor_summary(sensor("S2", "sensor.dead", None, None, 0));
    harness
        .datastore
        .seed_sensor_summary(sensor("S2", "sensor.alive", Some(20.0), Some(55.0), 6));

    let result = harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring"}))
        .await;

    // Only the silent sensor is a candidate
    assert_eq!(result.processed_count, 1);
    let alerts = harness.datastore.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::DeviceOffline);
    assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    assert!(alerts[0].message.contains("sensor.dead"));
    assert!(alerts[0].message.contains("120 minutes"));
}

#[tokio::test]
async fn test_shelf_filter_limits_staleness_pass() {
    let harness = TestHarness::new();
    harness
        .datastore
        .seed_sensor_summary(sensor("S1", "sensor.a", None, None, 0));
    harness
        .datastore
        .seed_sensor_summary(sensor("S2", "sensor.b", None, None, 0));

    let result = harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring", "shelf_ids": ["S2"]}))
        .await;

    assert_eq!(result.processed_count, 1);
    assert_eq!(harness.datastore.alerts()[0].shelf_id, "S2");
}

#[tokio::test]
async fn test_responsiveness_failure_is_per_item() {
    let harness = TestHarness::new();
    harness
        .datastore
        .seed_sensor_summary(sensor("S1", "sensor.a", None, None, 0));
    harness.datastore.fail_operation("check_device_responsiveness");

    let result = harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring"}))
        .await;

    assert!(result.success);
    assert_eq!(result.error_count, 1);
    assert!(harness.datastore.alerts().is_empty());
}

#[tokio::test]
async fn test_harvest_threshold_boundary() {
    let harness = TestHarness::new();
    harness.datastore.seed_schedule_summary(schedule("S1", 95.0, 5));
    harness.datastore.seed_schedule_summary(schedule("S2", 94.9, 5));

    let result = harness
        .processor
        .invoke(&json!({"task_type": "schedule_automation"}))
        .await;

    assert_eq!(result.processed_count, 2);
    let alerts = harness.datastore.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].shelf_id, "S1");
    assert_eq!(alerts[0].alert_type, AlertType::HarvestReady);
    assert_eq!(alerts[0].severity, AlertSeverity::Low);
}

#[tokio::test]
async fn test_overdue_message_uses_absolute_days() {
    let harness = TestHarness::new();
    harness.datastore.seed_schedule_summary(schedule("S3", 60.0, -3));
    harness.datastore.seed_schedule_summary(schedule("S4", 60.0, 0));

    harness
        .processor
        .invoke(&json!({"task_type": "schedule_automation"}))
        .await;

    let alerts = harness.datastore.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::ScheduleOverdue);
    assert!(alerts[0].message.contains("3 days overdue"));
}

#[tokio::test]
async fn test_schedule_automation_end_to_end() {
    let harness = TestHarness::new();
    harness.datastore.seed_schedule_summary(schedule("S1", 97.0, -1));
    harness.datastore.seed_schedule_summary(schedule("S9", 99.0, -4));

    let result = harness
        .processor
        .invoke(&json!({"task_type": "schedule_automation", "shelf_ids": ["S1"]}))
        .await;

    assert!(result.success);
    assert_eq!(result.processed_count, 1);
    assert_eq!(result.error_count, 0);

    let types: Vec<AlertType> = harness
        .datastore
        .alerts()
        .iter()
        .map(|a| a.alert_type)
        .collect();
    assert_eq!(types, vec![AlertType::HarvestReady, AlertType::ScheduleOverdue]);

    let logs = harness.datastore.performance_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].function_name, "automation-processor");
    assert_eq!(logs[0].success_count, 1);
}

#[tokio::test]
async fn test_forced_refresh_runs_before_monitoring() {
    let harness = TestHarness::new();

    let result = harness
        .processor
        .invoke(&json!({"task_type": "schedule_automation", "force_refresh": true}))
        .await;

    assert_eq!(harness.datastore.refresh_count(), 1);
    assert_eq!(result.operations[0], "Refreshed summary views");
}

#[tokio::test]
async fn test_mutation_heuristic_triggers_refresh() {
    let harness = TestHarness::new();
    harness.datastore.set_mutation_stats("sensor_readings", 90, 5, 0);
    harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring"}))
        .await;
    assert_eq!(harness.datastore.refresh_count(), 0);

    harness.datastore.set_mutation_stats("sensor_readings", 250, 5, 0);
    harness
        .processor
        .invoke(&json!({"task_type": "sensor_monitoring"}))
        .await;
    assert_eq!(harness.datastore.refresh_count(), 1);

    // Sync does not read the summary views
    harness.datastore.set_mutation_stats("sensor_readings", 900, 5, 0);
    harness
        .processor
        .invoke(&json!({"task_type": "home_assistant_sync"}))
        .await;
    assert_eq!(harness.datastore.refresh_count(), 1);
}

//! Environmental control decisions.

mod common;

use common::{schedule, sensor, TestHarness};
use farm_automation::models::{DeviceAction, DeviceType};
use farm_automation::services::decide_commands;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    /// Property: readings inside both ranges never produce a command
    #[test]
    fn in_range_readings_issue_no_commands(
        temperature in 18.0f64..=24.0,
        humidity in 50.0f64..=70.0,
    ) {
        let commands = decide_commands(
            &schedule("S1", 40.0, 10),
            &sensor("S1", "sensor.s1", Some(temperature), Some(humidity), 3),
        );
        prop_assert!(commands.is_empty(), "unexpected commands: {:?}", commands);
    }

    /// Property: at most one command per dimension, always turn_on
    #[test]
    fn at_most_one_command_per_dimension(
        temperature in -10.0f64..50.0,
        humidity in 0.0f64..100.0,
    ) {
        let commands = decide_commands(
            &schedule("S1", 40.0, 10),
            &sensor("S1", "sensor.s1", Some(temperature), Some(humidity), 3),
        );

        let temperature_commands = commands
            .iter()
            .filter(|c| matches!(c.device_type, DeviceType::Heater | DeviceType::Fan))
            .count();
        let humidity_commands = commands
            .iter()
            .filter(|c| matches!(c.device_type, DeviceType::Humidifier | DeviceType::Dehumidifier))
            .count();

        prop_assert!(temperature_commands <= 1);
        prop_assert!(humidity_commands <= 1);
        prop_assert!(commands.iter().all(|c| c.action == DeviceAction::TurnOn));
    }
}

#[test]
fn test_just_below_minimum_turns_on_heater_only() {
    let commands = decide_commands(
        &schedule("S1", 40.0, 10),
        &sensor("S1", "sensor.s1", Some(18.0 - 0.1), Some(60.0), 3),
    );

    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].device_type, DeviceType::Heater);
    assert_eq!(commands[0].action, DeviceAction::TurnOn);
    assert_eq!(commands[0].shelf_id, "S1");
}

#[tokio::test]
async fn test_environmental_control_dispatches_commands() {
    let harness = TestHarness::new();
    harness.datastore.seed_schedule_summary(schedule("S1", 40.0, 10));
    harness.datastore.seed_schedule_summary(schedule("S2", 40.0, 10));
    harness
        .datastore
        .seed_sensor_summary(sensor("S1", "sensor.s1", Some(26.0), Some(45.0), 4));
    // No reading this hour: S2 is skipped
    harness
        .datastore
        .seed_sensor_summary(sensor("S2", "sensor.s2", Some(10.0), None, 0));

    let result = harness
        .processor
        .invoke(&json!({"task_type": "environmental_control"}))
        .await;

    assert!(result.success);
    assert_eq!(result.processed_count, 1);

    let commands = harness.datastore.control_commands();
    let types: Vec<DeviceType> = commands.iter().map(|c| c.device_type).collect();
    assert_eq!(types, vec![DeviceType::Fan, DeviceType::Humidifier]);
    assert_eq!(commands[0].parameters["reading"], 26.0);
    assert_eq!(commands[0].parameters["target"], 24.0);
}

#[tokio::test]
async fn test_repeated_evaluation_repeats_commands() {
    let harness = TestHarness::new();
    harness.datastore.seed_schedule_summary(schedule("S1", 40.0, 10));
    harness
        .datastore
        .seed_sensor_summary(sensor("S1", "sensor.s1", Some(17.0), None, 1));

    for _ in 0..2 {
        harness
            .processor
            .invoke(&json!({"task_type": "environmental_control"}))
            .await;
    }

    assert_eq!(harness.datastore.control_commands().len(), 2);
}

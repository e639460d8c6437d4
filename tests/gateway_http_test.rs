//! HTTP device gateway against a mock home-automation API.

mod common;

use std::sync::Arc;

use common::entity;
use farm_automation::cache::SharedCacheTier;
use farm_automation::clock::{Clock, ManualClock};
use farm_automation::config::{GatewayConfig, ProcessorConfig};
use farm_automation::database::InMemoryDatastore;
use farm_automation::gateway::{DeviceGateway, GatewayError, HttpDeviceGateway};
use farm_automation::messaging::InMemoryQueueService;
use farm_automation::{ProcessorDependencies, TaskProcessor};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        base_url: Some(server.uri()),
        access_token: Some("test-token".to_string()),
        timeout_ms: 2_000,
    }
}

#[tokio::test]
async fn test_fetch_states_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "entity_id": "switch.heater_1",
                "state": "off",
                "attributes": {"friendly_name": "Heater 1"},
                "last_changed": "2026-03-01T12:00:00Z",
                "last_updated": "2026-03-01T12:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpDeviceGateway::new(&gateway_config(&server)).unwrap();
    let states = gateway.fetch_states().await.unwrap();

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].entity_id, "switch.heater_1");
    assert_eq!(states[0].friendly_name(), Some("Heater 1"));
}

#[tokio::test]
async fn test_execute_posts_service_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_json(json!({"entity_id": "light.grow_lamp", "brightness": 180})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpDeviceGateway::new(&gateway_config(&server)).unwrap();
    gateway
        .execute("light.grow_lamp", "light", "turn_on", &json!({"brightness": 180}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/switch/turn_on"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown entity"))
        .mount(&server)
        .await;

    let gateway = HttpDeviceGateway::new(&gateway_config(&server)).unwrap();
    let err = gateway
        .execute("switch.missing", "switch", "turn_on", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Status {
            status: 400,
            body: "unknown entity".to_string()
        }
    );
}

#[tokio::test]
async fn test_discovery_through_processor() {
    let server = MockServer::start().await;
    let states = vec![
        entity("switch.heater_1", "off"),
        entity("sensor.shelf_1_temperature", "21.0"),
        entity("input_boolean.night_mode", "on"),
    ];
    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&states))
        .mount(&server)
        .await;

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
    let datastore = Arc::new(InMemoryDatastore::new());
    let gateway: Arc<dyn DeviceGateway> =
        Arc::new(HttpDeviceGateway::new(&gateway_config(&server)).unwrap());
    let processor = TaskProcessor::new(
        &ProcessorConfig::default(),
        ProcessorDependencies {
            datastore: datastore.clone(),
            queue: Arc::new(InMemoryQueueService::with_clock(clock.clone())),
            gateway: Some(gateway),
            shared_cache: SharedCacheTier::noop(),
            clock,
        },
    );

    let result = processor
        .invoke(&json!({"task_type": "device_discovery"}))
        .await;

    assert!(result.success);
    assert_eq!(result.processed_count, 2);
    let discovered = datastore.discovered_devices();
    assert_eq!(discovered["input_boolean.night_mode"].domain, "input_boolean");
    assert!(!discovered.contains_key("sensor.shelf_1_temperature"));
}

#[tokio::test]
async fn test_gateway_outage_is_a_task_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
    let gateway: Arc<dyn DeviceGateway> =
        Arc::new(HttpDeviceGateway::new(&gateway_config(&server)).unwrap());
    let processor = TaskProcessor::new(
        &ProcessorConfig::default(),
        ProcessorDependencies {
            datastore: Arc::new(InMemoryDatastore::new()),
            queue: Arc::new(InMemoryQueueService::with_clock(clock.clone())),
            gateway: Some(gateway),
            shared_cache: SharedCacheTier::noop(),
            clock,
        },
    );

    let result = processor
        .invoke(&json!({"task_type": "home_assistant_sync"}))
        .await;

    assert!(result.success);
    assert_eq!(result.error_count, 1);
    assert!(result.errors[0].starts_with("home_assistant_sync failed"));
}

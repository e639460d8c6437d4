//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use farm_automation::cache::{InMemorySharedCache, SharedCacheTier};
use farm_automation::clock::{Clock, ManualClock};
use farm_automation::config::ProcessorConfig;
use farm_automation::constants::queues;
use farm_automation::database::InMemoryDatastore;
use farm_automation::gateway::{DeviceGateway, InMemoryDeviceGateway};
use farm_automation::messaging::InMemoryQueueService;
use farm_automation::models::{ActiveScheduleSummary, EntityState, SensorSummary};
use farm_automation::{ProcessorDependencies, TaskProcessor};

pub const ALL_QUEUES: [&str; 5] = [
    queues::CRITICAL,
    queues::HIGH,
    queues::NORMAL,
    queues::LOW,
    queues::DEAD_LETTER,
];

/// A processor wired to in-memory collaborators that stay inspectable
pub struct TestHarness {
    pub clock: ManualClock,
    pub datastore: Arc<InMemoryDatastore>,
    pub queue: Arc<InMemoryQueueService>,
    pub gateway: Option<Arc<InMemoryDeviceGateway>>,
    pub shared_cache: InMemorySharedCache,
    pub processor: TaskProcessor,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(ProcessorConfig::default(), None)
    }

    pub fn with_gateway(gateway: InMemoryDeviceGateway) -> Self {
        Self::build(ProcessorConfig::default(), Some(Arc::new(gateway)))
    }

    pub fn build(config: ProcessorConfig, gateway: Option<Arc<InMemoryDeviceGateway>>) -> Self {
        let clock = ManualClock::default();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

        let datastore = Arc::new(InMemoryDatastore::new());
        let queue = Arc::new(InMemoryQueueService::with_queues(
            &ALL_QUEUES,
            shared_clock.clone(),
        ));
        let shared_cache = InMemorySharedCache::new(shared_clock.clone());

        let processor = TaskProcessor::new(
            &config,
            ProcessorDependencies {
                datastore: datastore.clone(),
                queue: queue.clone(),
                gateway: gateway.clone().map(|g| g as Arc<dyn DeviceGateway>),
                shared_cache: SharedCacheTier::in_memory(
                    shared_cache.clone(),
                    &config.cache,
                    shared_clock.clone(),
                ),
                clock: shared_clock,
            },
        );

        Self {
            clock,
            datastore,
            queue,
            gateway,
            shared_cache,
            processor,
        }
    }

    pub fn gateway(&self) -> &InMemoryDeviceGateway {
        self.gateway
            .as_deref()
            .expect("harness was built without a gateway")
    }
}

pub fn schedule(shelf_id: &str, completion: f64, days_remaining: i32) -> ActiveScheduleSummary {
    ActiveScheduleSummary {
        schedule_id: format!("sch-{shelf_id}"),
        shelf_id: shelf_id.to_string(),
        species_name: "Basil".to_string(),
        completion_percentage: completion,
        days_remaining,
        target_temperature_min: Some(18.0),
        target_temperature_max: Some(24.0),
        target_humidity_min: Some(50.0),
        target_humidity_max: Some(70.0),
        full_path: format!("Farm/Row A/Rack 1/{shelf_id}"),
    }
}

pub fn sensor(
    shelf_id: &str,
    entity_id: &str,
    temperature: Option<f64>,
    humidity: Option<f64>,
    readings_last_hour: i64,
) -> SensorSummary {
    SensorSummary {
        device_assignment_id: format!("da-{entity_id}"),
        shelf_id: shelf_id.to_string(),
        entity_id: entity_id.to_string(),
        latest_temperature: temperature,
        latest_humidity: humidity,
        readings_last_hour,
        full_path: format!("Farm/Row A/Rack 1/{shelf_id}"),
    }
}

pub fn entity(entity_id: &str, state: &str) -> EntityState {
    EntityState {
        entity_id: entity_id.to_string(),
        state: state.to_string(),
        attributes: serde_json::json!({"friendly_name": entity_id}),
        last_changed: Some("2026-03-01T12:00:00Z".to_string()),
        last_updated: Some("2026-03-01T12:00:00Z".to_string()),
    }
}

//! # Device State Sync
//!
//! Mirrors gateway entity states into the datastore and records controllable
//! devices found there. Without a configured gateway both operations are
//! benign no-ops.

use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::constants::GATEWAY_STATES_CACHE_KEY;
use crate::database::Datastore;
use crate::error::{ProcessorError, ProcessorResult};
use crate::gateway::DeviceGateway;
use crate::models::{DiscoveredDevice, EntityState, ProcessingResult};

#[derive(Debug, Clone)]
pub struct DeviceSyncService {
    gateway: Option<Arc<dyn DeviceGateway>>,
    datastore: Arc<dyn Datastore>,
    cache: Arc<CacheManager>,
}

impl DeviceSyncService {
    pub fn new(
        gateway: Option<Arc<dyn DeviceGateway>>,
        datastore: Arc<dyn Datastore>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            gateway,
            datastore,
            cache,
        }
    }

    pub fn gateway(&self) -> Option<&Arc<dyn DeviceGateway>> {
        self.gateway.as_ref()
    }

    /// Upsert every gateway entity state, fetched through the cache.
    ///
    /// Returns the number of states synced.
    pub async fn sync(&self, result: &mut ProcessingResult) -> ProcessorResult<usize> {
        let Some(gateway) = &self.gateway else {
            result.record_operation("Device sync skipped: no gateway configured");
            return Ok(0);
        };

        let states: Vec<EntityState> = self
            .cache
            .get_or_fetch(GATEWAY_STATES_CACHE_KEY, None, || {
                let gateway = Arc::clone(gateway);
                async move { gateway.fetch_states().await.map_err(ProcessorError::from) }
            })
            .await?;

        let mut synced = 0;
        for state in &states {
            match self.datastore.upsert_device_state(state).await {
                Ok(()) => synced += 1,
                Err(e) => result.record_error(format!(
                    "Failed to sync state of {}: {e}",
                    state.entity_id
                )),
            }
        }

        result.record_processed(synced as u64);
        result.record_operation(format!("Synced {synced} device states"));
        info!(synced = synced, total = states.len(), "🔄 Device states synced");
        Ok(synced)
    }

    /// Record every controllable entity as a known device.
    ///
    /// Reads the gateway directly so newly added devices show up immediately.
    pub async fn discover(&self, result: &mut ProcessingResult) -> ProcessorResult<usize> {
        let Some(gateway) = &self.gateway else {
            result.record_operation("Device discovery skipped: no gateway configured");
            return Ok(0);
        };

        let states = gateway.fetch_states().await?;
        let mut discovered = 0;

        for state in states.iter().filter(|s| s.is_controllable()) {
            let device = DiscoveredDevice::from(state);
            match self.datastore.upsert_discovered_device(&device).await {
                Ok(()) => discovered += 1,
                Err(e) => {
                    warn!(entity_id = %device.entity_id, error = %e, "Failed to record device");
                    result.record_error(format!(
                        "Failed to record discovered device {}: {e}",
                        device.entity_id
                    ));
                }
            }
        }

        result.record_processed(discovered as u64);
        result.record_operation(format!("Discovered {discovered} controllable devices"));
        Ok(discovered)
    }
}

//! # Maintenance Tasks
//!
//! Old-record cleanup and the dependency health probes behind the
//! `queue_cleanup` and `health_check` task kinds.

use std::sync::Arc;
use tracing::info;

use crate::cache::SharedCacheTier;
use crate::config::MaintenanceConfig;
use crate::database::Datastore;
use crate::error::ProcessorResult;
use crate::gateway::DeviceGateway;
use crate::messaging::QueueService;
use crate::models::ProcessingResult;

#[derive(Debug, Clone)]
pub struct MaintenanceService {
    datastore: Arc<dyn Datastore>,
    queue: Arc<dyn QueueService>,
    shared_cache: SharedCacheTier,
    gateway: Option<Arc<dyn DeviceGateway>>,
    config: MaintenanceConfig,
}

impl MaintenanceService {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        queue: Arc<dyn QueueService>,
        shared_cache: SharedCacheTier,
        gateway: Option<Arc<dyn DeviceGateway>>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            datastore,
            queue,
            shared_cache,
            gateway,
            config,
        }
    }

    /// Remove records older than the retention window
    pub async fn cleanup(&self, result: &mut ProcessingResult) -> ProcessorResult<u64> {
        let removed = self
            .datastore
            .cleanup_old_records(self.config.retention_days)
            .await?;

        result.record_processed(1);
        result.record_operation(format!(
            "Cleaned up {removed} records older than {} days",
            self.config.retention_days
        ));
        info!(removed = removed, retention_days = self.config.retention_days, "🧹 Cleanup complete");
        Ok(removed)
    }

    /// Probe every dependency; returns whether all of them are healthy
    pub async fn health_check(&self, result: &mut ProcessingResult) -> bool {
        let mut healthy = true;

        healthy &= probe(
            result,
            "Datastore",
            self.datastore.health_check().await.map_err(|e| e.to_string()),
        );
        healthy &= probe(
            result,
            &format!("Queue backend ({})", self.queue.provider_name()),
            self.queue.health_check().await.map_err(|e| e.to_string()),
        );
        healthy &= probe(
            result,
            &format!("Shared cache ({})", self.shared_cache.provider_name()),
            self.shared_cache.health_check().await.map_err(|e| e.to_string()),
        );

        match &self.gateway {
            Some(gateway) => {
                healthy &= probe(
                    result,
                    "Device gateway",
                    gateway.health_check().await.map_err(|e| e.to_string()),
                );
            }
            None => result.record_operation("Device gateway health: not configured"),
        }

        healthy
    }
}

fn probe(result: &mut ProcessingResult, component: &str, outcome: Result<bool, String>) -> bool {
    match outcome {
        Ok(true) => {
            result.record_operation(format!("{component} health: ok"));
            true
        }
        Ok(false) => {
            result.record_operation(format!("{component} health: unhealthy"));
            result.record_error(format!("{component} health check reported unhealthy"));
            false
        }
        Err(e) => {
            result.record_operation(format!("{component} health: failed"));
            result.record_error(format!("{component} health check failed: {e}"));
            false
        }
    }
}

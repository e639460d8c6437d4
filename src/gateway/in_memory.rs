//! In-memory device gateway for tests and dry runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{DeviceGateway, GatewayError};
use crate::models::EntityState;

/// A service call recorded by [`InMemoryDeviceGateway`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCall {
    pub entity_id: String,
    pub domain: String,
    pub service: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct InMemoryDeviceGateway {
    states: Mutex<Vec<EntityState>>,
    executed: Mutex<Vec<ExecutedCall>>,
    failing_entities: Mutex<HashSet<String>>,
    fail_fetch: AtomicBool,
    fetch_count: AtomicUsize,
}

impl InMemoryDeviceGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(states: Vec<EntityState>) -> Self {
        let gateway = Self::default();
        *gateway.states.lock() = states;
        gateway
    }

    /// Service calls made so far
    pub fn executed(&self) -> Vec<ExecutedCall> {
        self.executed.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Reject service calls for `entity_id` with a 500
    pub fn fail_entity(&self, entity_id: &str) {
        self.failing_entities.lock().insert(entity_id.to_string());
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceGateway for InMemoryDeviceGateway {
    async fn fetch_states(&self) -> Result<Vec<EntityState>, GatewayError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("connection refused".to_string()));
        }
        Ok(self.states.lock().clone())
    }

    async fn execute(
        &self,
        entity_id: &str,
        domain: &str,
        service: &str,
        parameters: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        if self.failing_entities.lock().contains(entity_id) {
            return Err(GatewayError::Status {
                status: 500,
                body: format!("failed to call {domain}.{service}"),
            });
        }

        self.executed.lock().push(ExecutedCall {
            entity_id: entity_id.to_string(),
            domain: domain.to_string(),
            service: service.to_string(),
            parameters: parameters.clone(),
        });
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, GatewayError> {
        Ok(!self.fail_fetch.load(Ordering::SeqCst))
    }
}

//! # View Freshness Coordinator
//!
//! Mutation-count heuristic deciding when the derived summary views are worth
//! recomputing. It can both over- and under-trigger; the threshold is a tuning
//! knob, not a staleness guarantee.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::FreshnessConfig;
use crate::database::Datastore;
use crate::error::ProcessorResult;
use crate::logging::log_error;
use crate::models::ProcessingResult;

#[derive(Debug)]
pub struct ViewFreshnessCoordinator {
    datastore: Arc<dyn Datastore>,
    config: FreshnessConfig,
    /// Counter snapshot from the previous check; empty after a cold start
    baseline: Mutex<HashMap<String, u64>>,
}

impl ViewFreshnessCoordinator {
    pub fn new(datastore: Arc<dyn Datastore>, config: FreshnessConfig) -> Self {
        Self {
            datastore,
            config,
            baseline: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the watched tables changed by more than the threshold since the
    /// previous check. Every call advances the baseline.
    pub async fn should_refresh(&self) -> ProcessorResult<bool> {
        let stats = self
            .datastore
            .table_mutation_stats(&self.config.watched_tables)
            .await?;

        let mut baseline = self.baseline.lock();
        let mut delta: u64 = 0;
        for table in &stats {
            let total = table.total();
            let previous = baseline.insert(table.table_name.clone(), total).unwrap_or(0);
            // A counter reset shows up as a smaller total and counts as a fresh start
            delta = delta.saturating_add(total.saturating_sub(previous));
        }

        debug!(
            delta = delta,
            threshold = self.config.refresh_threshold,
            "Summary view mutation delta"
        );
        Ok(delta > self.config.refresh_threshold)
    }

    /// Recompute every derived view; a failure is recorded, never raised.
    pub async fn refresh(&self, result: &mut ProcessingResult) -> bool {
        match self.datastore.refresh_summary_views().await {
            Ok(()) => {
                info!("✅ Summary views refreshed");
                result.record_operation("Refreshed summary views");
                true
            }
            Err(e) => {
                log_error("freshness", "refresh", &e.to_string(), None);
                result.record_error(format!("Summary view refresh failed: {e}"));
                false
            }
        }
    }

    /// Refresh when forced or when the heuristic fires
    pub async fn maybe_refresh(&self, force: bool, result: &mut ProcessingResult) {
        let needed = if force {
            true
        } else {
            match self.should_refresh().await {
                Ok(needed) => needed,
                Err(e) => {
                    result.record_error(format!("View freshness check failed: {e}"));
                    false
                }
            }
        };

        if needed {
            self.refresh(result).await;
        }
    }
}

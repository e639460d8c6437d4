//! # Task Processor
//!
//! Entry point of one invocation. Parses the request, optionally drains the
//! queues and runs cache maintenance, refreshes the summary views when they
//! look stale, routes to the requested components and always finishes by
//! writing a performance-log row.
//!
//! Errors follow three scopes: per-item errors are recorded by the component
//! that hit them, a component failing as a whole is recorded once here and
//! does not stop the rest of a sweep, and only a malformed request is fatal.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::cache::{CacheManager, SharedCacheTier};
use crate::clock::Clock;
use crate::config::ProcessorConfig;
use crate::database::Datastore;
use crate::error::ProcessorResult;
use crate::gateway::DeviceGateway;
use crate::messaging::QueueService;
use crate::models::{CacheOperation, InvocationRequest, ProcessingResult, TaskKind};
use crate::services::{
    DeviceSyncService, EnvironmentalControlEngine, MaintenanceService, PerformanceLogger,
    QueueConsumer, SensorScheduleMonitor, TaskHandlers, ViewFreshnessCoordinator,
};

/// External collaborators of the processor
#[derive(Debug, Clone)]
pub struct ProcessorDependencies {
    pub datastore: Arc<dyn Datastore>,
    pub queue: Arc<dyn QueueService>,
    /// `None` turns sync and discovery into no-ops
    pub gateway: Option<Arc<dyn DeviceGateway>>,
    pub shared_cache: SharedCacheTier,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug)]
pub struct TaskProcessor {
    cache: Arc<CacheManager>,
    freshness: ViewFreshnessCoordinator,
    monitor: SensorScheduleMonitor,
    control: EnvironmentalControlEngine,
    sync: DeviceSyncService,
    maintenance: MaintenanceService,
    consumer: QueueConsumer,
    performance: PerformanceLogger,
}

impl TaskProcessor {
    pub fn new(config: &ProcessorConfig, deps: ProcessorDependencies) -> Self {
        let ProcessorDependencies {
            datastore,
            queue,
            gateway,
            shared_cache,
            clock,
        } = deps;

        let cache = Arc::new(CacheManager::new(
            &config.cache,
            shared_cache.clone(),
            clock.clone(),
        ));
        let monitor = SensorScheduleMonitor::new(datastore.clone(), config.monitoring.clone());
        let handlers = TaskHandlers::new(datastore.clone(), gateway.clone(), monitor.clone());

        Self {
            freshness: ViewFreshnessCoordinator::new(datastore.clone(), config.freshness.clone()),
            control: EnvironmentalControlEngine::new(datastore.clone()),
            sync: DeviceSyncService::new(gateway.clone(), datastore.clone(), cache.clone()),
            maintenance: MaintenanceService::new(
                datastore.clone(),
                queue.clone(),
                shared_cache,
                gateway,
                config.maintenance.clone(),
            ),
            consumer: QueueConsumer::new(queue, handlers, config.queues.clone(), clock.clone()),
            performance: PerformanceLogger::new(
                datastore,
                config.performance.function_name.clone(),
                clock,
            ),
            monitor,
            cache,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Run one invocation for a raw JSON request body
    pub async fn invoke(&self, body: &serde_json::Value) -> ProcessingResult {
        let start = Instant::now();

        let request = match InvocationRequest::from_json(body) {
            Ok(request) => request,
            Err(e) => {
                return self
                    .fail(format!("Invalid request: {e}"), elapsed_ms(start))
                    .await
            }
        };

        if let TaskKind::Unknown(other) = &request.task_kind {
            return self
                .fail(format!("Unknown task type: {other}"), elapsed_ms(start))
                .await;
        }

        let mut result = ProcessingResult::new();
        self.run(&request, &mut result).await;
        result.processing_time_ms = elapsed_ms(start);

        info!(
            task_type = %request.task_kind,
            processed = result.processed_count,
            errors = result.error_count,
            duration_ms = result.processing_time_ms,
            "✅ Invocation complete"
        );
        self.performance.log(&result).await;
        result
    }

    /// Run a parsed request
    pub async fn process(&self, request: &InvocationRequest) -> ProcessingResult {
        match serde_json::to_value(request) {
            Ok(body) => self.invoke(&body).await,
            Err(e) => self.fail(format!("Invalid request: {e}"), 0.0).await,
        }
    }

    async fn fail(&self, error: String, processing_time_ms: f64) -> ProcessingResult {
        warn!(error = %error, "❌ Rejecting invocation");
        let result = ProcessingResult::fatal(error, processing_time_ms);
        self.performance.log(&result).await;
        result
    }

    async fn run(&self, request: &InvocationRequest, result: &mut ProcessingResult) {
        let kind = &request.task_kind;

        if let Some(operation) = request.cache_operation {
            self.run_cache_operation(operation, result).await;
            // A bare cache request does not trigger the sweep
            if *kind == TaskKind::Comprehensive {
                return;
            }
        }

        if *kind == TaskKind::Comprehensive || request.queue_process {
            let summary = self.consumer.drain(result).await;
            result.record_operation(format!(
                "Queue drain: {} processed, {} failed, {} dead-lettered",
                summary.processed, summary.failed, summary.dead_lettered
            ));
        }

        if kind.reads_summaries() {
            self.freshness
                .maybe_refresh(request.force_refresh, result)
                .await;
        }

        let shelves = request.shelf_filter();

        match kind {
            TaskKind::SensorMonitoring => {
                let outcome = self.monitor.run_staleness_pass(shelves, result).await;
                record_task_failure(result, "sensor_monitoring", outcome);
            }
            TaskKind::ScheduleAutomation => {
                let outcome = self.monitor.run_schedule_pass(shelves, result).await;
                record_task_failure(result, "schedule_automation", outcome);
            }
            TaskKind::EnvironmentalControl => {
                let outcome = self.control.evaluate(shelves, result).await;
                record_task_failure(result, "environmental_control", outcome);
            }
            TaskKind::HomeAssistantSync => {
                let outcome = self.sync.sync(result).await;
                record_task_failure(result, "home_assistant_sync", outcome);
            }
            TaskKind::DeviceDiscovery => {
                let outcome = self.sync.discover(result).await;
                record_task_failure(result, "device_discovery", outcome);
            }
            TaskKind::HealthCheck => {
                self.maintenance.health_check(result).await;
            }
            TaskKind::QueueCleanup => {
                let outcome = self.maintenance.cleanup(result).await;
                record_task_failure(result, "queue_cleanup", outcome);
            }
            TaskKind::BatchProcessing => {
                self.run_monitoring_and_control(shelves, result).await;
            }
            TaskKind::Comprehensive => {
                let outcome = self.sync.sync(result).await;
                record_task_failure(result, "home_assistant_sync", outcome);
                self.run_monitoring_and_control(shelves, result).await;
            }
            // Duplicate of the rejection in `invoke`, which runs first
            TaskKind::Unknown(other) => {
                warn!(task_type = %other, "Unknown task type reached routing");
                result.success = false;
                result.record_error(format!("Unknown task type: {other}"));
            }
        }
    }

    async fn run_monitoring_and_control(
        &self,
        shelves: Option<&[String]>,
        result: &mut ProcessingResult,
    ) {
        let outcome = self.monitor.run_staleness_pass(shelves, result).await;
        record_task_failure(result, "sensor_monitoring", outcome);

        let outcome = self.monitor.run_schedule_pass(shelves, result).await;
        record_task_failure(result, "schedule_automation", outcome);

        let outcome = self.control.evaluate(shelves, result).await;
        record_task_failure(result, "environmental_control", outcome);
    }

    async fn run_cache_operation(&self, operation: CacheOperation, result: &mut ProcessingResult) {
        match operation {
            CacheOperation::PerformanceTest => {
                for line in self.cache.performance_test().await {
                    result.record_operation(line);
                }
            }
            CacheOperation::ClearCache => match self.cache.clear_all().await {
                Ok(summary) => result.record_operation(format!(
                    "Cleared cache: {} local entries, {} shared keys",
                    summary.local_entries, summary.shared_keys
                )),
                Err(e) => result.record_error(format!("Cache clear failed: {e}")),
            },
            CacheOperation::CacheStats => {
                let stats = self.cache.stats();
                result.record_operation(format!(
                    "Cache stats: {} local entries [{}], shared provider {}",
                    stats.entries,
                    stats.keys.join(", "),
                    stats.shared_provider
                ));
            }
        }
    }
}

fn record_task_failure<T>(result: &mut ProcessingResult, task: &str, outcome: ProcessorResult<T>) {
    if let Err(e) = outcome {
        warn!(task = task, error = %e, "Task failed");
        result.record_error(format!("{task} failed: {e}"));
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::InMemoryDatastore;
    use crate::messaging::InMemoryQueueService;
    use serde_json::json;

    fn processor(datastore: Arc<InMemoryDatastore>) -> TaskProcessor {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        TaskProcessor::new(
            &ProcessorConfig::default(),
            ProcessorDependencies {
                datastore,
                queue: Arc::new(InMemoryQueueService::with_clock(clock.clone())),
                gateway: None,
                shared_cache: SharedCacheTier::noop(),
                clock,
            },
        )
    }

    #[tokio::test]
    async fn test_unknown_task_type_is_fatal_and_logged() {
        let datastore = Arc::new(InMemoryDatastore::new());
        let result = processor(datastore.clone())
            .invoke(&json!({"task_type": "irrigate"}))
            .await;

        assert!(!result.success);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.http_status(), 500);
        assert_eq!(datastore.performance_logs().len(), 1);
    }

    #[tokio::test]
    async fn test_run_records_unknown_kind_without_invoke() {
        let request = InvocationRequest::from_json(&json!({"task_type": "irrigate"})).unwrap();
        let mut result = ProcessingResult::new();
        processor(Arc::new(InMemoryDatastore::new()))
            .run(&request, &mut result)
            .await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["Unknown task type: irrigate"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_fatal() {
        let datastore = Arc::new(InMemoryDatastore::new());
        let result = processor(datastore)
            .invoke(&json!({"shelf_ids": "S1"}))
            .await;
        assert!(!result.success);
        assert!(result.errors[0].starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_task_failure_is_isolated() {
        let datastore = Arc::new(InMemoryDatastore::new());
        datastore.fail_operation("stale_sensor_summaries");
        let result = processor(datastore)
            .invoke(&json!({"task_type": "batch_processing"}))
            .await;

        assert!(result.success);
        assert_eq!(result.error_count, 1);
        assert!(result
            .operations
            .iter()
            .any(|op| op.starts_with("Environmental control")));
    }

    #[tokio::test]
    async fn test_bare_cache_operation_skips_sweep() {
        let datastore = Arc::new(InMemoryDatastore::new());
        let result = processor(datastore)
            .invoke(&json!({"cache_operation": "cache_stats"}))
            .await;

        assert!(result.success);
        assert_eq!(result.operations.len(), 1);
        assert!(result.operations[0].starts_with("Cache stats: 0 local entries"));
    }
}

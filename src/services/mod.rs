//! # Processor Services
//!
//! The components an invocation routes to. Each takes the invocation's
//! [`ProcessingResult`](crate::models::ProcessingResult) by mutable reference
//! and records its own operations and per-item errors on it.

pub mod device_sync;
pub mod environment_control;
pub mod freshness;
pub mod maintenance;
pub mod monitor;
pub mod performance_logger;
pub mod queue_consumer;
pub mod task_handlers;

pub use device_sync::DeviceSyncService;
pub use environment_control::{decide_commands, EnvironmentalControlEngine};
pub use freshness::ViewFreshnessCoordinator;
pub use maintenance::MaintenanceService;
pub use monitor::{schedule_alerts, SensorScheduleMonitor};
pub use performance_logger::PerformanceLogger;
pub use queue_consumer::{effective_retry_count, DrainSummary, QueueConsumer};
pub use task_handlers::TaskHandlers;

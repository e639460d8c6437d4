//! Invocation request envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an invocation should do.
///
/// Deserialized from the request's optional `task_type` string. An omitted
/// value selects the comprehensive sweep; an unrecognized value is kept as
/// [`TaskKind::Unknown`] so the dispatcher can reject it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TaskKind {
    SensorMonitoring,
    ScheduleAutomation,
    EnvironmentalControl,
    HomeAssistantSync,
    DeviceDiscovery,
    HealthCheck,
    BatchProcessing,
    QueueCleanup,
    #[default]
    Comprehensive,
    Unknown(String),
}

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SensorMonitoring => "sensor_monitoring",
            Self::ScheduleAutomation => "schedule_automation",
            Self::EnvironmentalControl => "environmental_control",
            Self::HomeAssistantSync => "home_assistant_sync",
            Self::DeviceDiscovery => "device_discovery",
            Self::HealthCheck => "health_check",
            Self::BatchProcessing => "batch_processing",
            Self::QueueCleanup => "queue_cleanup",
            Self::Comprehensive => "comprehensive",
            Self::Unknown(other) => other,
        }
    }

    /// Whether this kind reads the derived summary views
    pub fn reads_summaries(&self) -> bool {
        matches!(
            self,
            Self::SensorMonitoring
                | Self::ScheduleAutomation
                | Self::EnvironmentalControl
                | Self::BatchProcessing
                | Self::Comprehensive
        )
    }
}

impl From<Option<String>> for TaskKind {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            None => Self::Comprehensive,
            Some("sensor_monitoring") => Self::SensorMonitoring,
            Some("schedule_automation") => Self::ScheduleAutomation,
            Some("environmental_control") => Self::EnvironmentalControl,
            Some("home_assistant_sync") => Self::HomeAssistantSync,
            Some("device_discovery") => Self::DeviceDiscovery,
            Some("health_check") => Self::HealthCheck,
            Some("batch_processing") => Self::BatchProcessing,
            Some("queue_cleanup") => Self::QueueCleanup,
            Some(other) => Self::Unknown(other.to_string()),
        }
    }
}

impl From<TaskKind> for Option<String> {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Comprehensive => None,
            other => Some(other.as_str().to_string()),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache maintenance requested alongside (or instead of) a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOperation {
    PerformanceTest,
    ClearCache,
    CacheStats,
}

/// Structured request received by the processor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationRequest {
    #[serde(rename = "task_type", skip_serializing_if = "is_comprehensive")]
    pub task_kind: TaskKind,
    pub shelf_ids: Option<Vec<String>>,
    pub force_refresh: bool,
    pub queue_process: bool,
    pub cache_operation: Option<CacheOperation>,
}

fn is_comprehensive(kind: &TaskKind) -> bool {
    *kind == TaskKind::Comprehensive
}

impl InvocationRequest {
    pub fn for_kind(kind: TaskKind) -> Self {
        Self {
            task_kind: kind,
            ..Self::default()
        }
    }

    pub fn with_shelves(mut self, shelf_ids: Vec<String>) -> Self {
        self.shelf_ids = Some(shelf_ids);
        self
    }

    /// Parse a request body; an empty body is the comprehensive sweep
    pub fn from_json(body: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if body.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(body.clone())
    }

    /// Shelf filter as a slice, `None` when every shelf is in scope
    pub fn shelf_filter(&self) -> Option<&[String]> {
        self.shelf_ids.as_deref()
    }
}

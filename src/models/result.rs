//! Per-invocation processing result and its performance-log projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one invocation.
///
/// Created at invocation start and mutated by every component. `error_count`
/// always equals `errors.len()`; use [`record_error`](Self::record_error) rather
/// than pushing onto `errors` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub processed_count: u64,
    pub error_count: u64,
    pub processing_time_ms: f64,
    pub operations: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ProcessingResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingResult {
    pub fn new() -> Self {
        Self {
            success: true,
            processed_count: 0,
            error_count: 0,
            processing_time_ms: 0.0,
            operations: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Result of an invocation that could not start
    pub fn fatal(error: impl Into<String>, processing_time_ms: f64) -> Self {
        let mut result = Self::new();
        result.success = false;
        result.processing_time_ms = processing_time_ms;
        result.record_error(error);
        result
    }

    pub fn record_operation(&mut self, operation: impl Into<String>) {
        self.operations.push(operation.into());
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.error_count = self.errors.len() as u64;
    }

    pub fn record_processed(&mut self, count: u64) {
        self.processed_count += count;
    }

    /// Status code the transport should answer with
    pub fn http_status(&self) -> u16 {
        if self.success {
            200
        } else {
            500
        }
    }

    /// Successful items, clamped at zero
    pub fn success_count(&self) -> u64 {
        self.processed_count.saturating_sub(self.error_count)
    }
}

/// Row appended to the performance log after every invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLogEntry {
    pub function_name: String,
    pub processed_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub processing_time_ms: f64,
    pub context: PerformanceContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceContext {
    pub operations: Vec<String>,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceLogEntry {
    pub fn from_result(
        function_name: &str,
        result: &ProcessingResult,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            function_name: function_name.to_string(),
            processed_count: result.processed_count,
            success_count: result.success_count(),
            error_count: result.error_count,
            processing_time_ms: result.processing_time_ms,
            context: PerformanceContext {
                operations: result.operations.clone(),
                errors: result.errors.clone(),
                timestamp,
            },
        }
    }
}

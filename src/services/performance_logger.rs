//! Appends one performance-log row per invocation.

use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::database::Datastore;
use crate::logging::log_error;
use crate::models::{PerformanceLogEntry, ProcessingResult};

#[derive(Debug, Clone)]
pub struct PerformanceLogger {
    datastore: Arc<dyn Datastore>,
    function_name: String,
    clock: Arc<dyn Clock>,
}

impl PerformanceLogger {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        function_name: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            datastore,
            function_name: function_name.into(),
            clock,
        }
    }

    /// Persist the invocation's metrics.
    ///
    /// Failures are only logged; they never change the invocation outcome.
    pub async fn log(&self, result: &ProcessingResult) {
        let entry = PerformanceLogEntry::from_result(&self.function_name, result, self.clock.now());

        match self.datastore.append_performance_log(&entry).await {
            Ok(()) => debug!(
                function_name = %self.function_name,
                processed = entry.processed_count,
                errors = entry.error_count,
                "Performance log written"
            ),
            Err(e) => log_error(
                "performance_logger",
                "append_performance_log",
                &e.to_string(),
                Some(&self.function_name),
            ),
        }
    }
}

//! Error types for the automation task processor.

use thiserror::Error;

use crate::cache::CacheError;
use crate::gateway::GatewayError;
use crate::messaging::MessagingError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessorError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Messaging error: {0}")]
    MessagingError(String),
    #[error("Cache error: {0}")]
    CacheError(String),
    #[error("Device gateway error: {0}")]
    GatewayError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Handler error: {0}")]
    HandlerError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ProcessorError {
    fn from(error: serde_json::Error) -> Self {
        ProcessorError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for ProcessorError {
    fn from(err: sqlx::Error) -> Self {
        ProcessorError::DatabaseError(err.to_string())
    }
}

impl From<MessagingError> for ProcessorError {
    fn from(error: MessagingError) -> Self {
        ProcessorError::MessagingError(error.to_string())
    }
}

impl From<CacheError> for ProcessorError {
    fn from(error: CacheError) -> Self {
        ProcessorError::CacheError(error.to_string())
    }
}

impl From<GatewayError> for ProcessorError {
    fn from(error: GatewayError) -> Self {
        ProcessorError::GatewayError(error.to_string())
    }
}

impl From<config::ConfigError> for ProcessorError {
    fn from(error: config::ConfigError) -> Self {
        ProcessorError::ConfigurationError(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ProcessorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ProcessorError::ConfigurationError(format!("Configuration validation failed: {errors}"))
    }
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProcessorError::DatabaseError("connection refused".to_string());
        assert_eq!(err.to_string(), "Database error: connection refused");

        let err = ProcessorError::InvalidRequest("unknown task type".to_string());
        assert!(err.to_string().starts_with("Invalid request"));
    }

    #[test]
    fn test_error_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ProcessorError = json_err.into();
        assert!(matches!(err, ProcessorError::ValidationError(_)));

        let err: ProcessorError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ProcessorError::DatabaseError(_)));

        let err: ProcessorError = MessagingError::queue_not_found("critical_tasks").into();
        assert!(err.to_string().contains("critical_tasks"));
    }
}

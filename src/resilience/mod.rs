//! # Resilience Module
//!
//! Circuit breaking for external dependencies that may degrade without
//! failing the invocation (currently the shared cache tier).

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

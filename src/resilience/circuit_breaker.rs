//! # Circuit Breaker Implementation
//!
//! Fault isolation for the shared cache tier. Three states: Closed (normal
//! operation), Open (failing fast), and Half-Open (testing recovery).
//!
//! Callers use the manual protocol: ask [`CircuitBreaker::should_allow`]
//! before an operation, then report the outcome with
//! [`CircuitBreaker::record_success_manual`] or
//! [`CircuitBreaker::record_failure_manual`].

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed
    pub timeout: Duration,
    /// Successful probes needed to close again
    pub success_threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: AtomicU8,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,

    consecutive_failures: AtomicU64,
    half_open_successes: AtomicU64,

    /// Epoch millis when the circuit was opened (0 = not open)
    opened_at_millis: AtomicU64,
}

impl CircuitBreaker {
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            clock,
            consecutive_failures: AtomicU64::new(0),
            half_open_successes: AtomicU64::new(0),
            opened_at_millis: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether a call may proceed. Moves Open to Half-Open once the timeout has elapsed.
    pub fn should_allow(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened = self.opened_at_millis.load(Ordering::Acquire);
                if opened == 0 {
                    warn!(component = %self.name, "Circuit open but no timestamp recorded");
                    return true;
                }

                let elapsed = self.now_millis().saturating_sub(opened);
                if elapsed >= self.config.timeout.as_millis() as u64 {
                    self.transition_to_half_open();
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success_manual(&self, duration: Duration) {

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation succeeded"
        );

        match self.state() {
            CircuitState::HalfOpen => {
                let successes = self.half_open_successes.fetch_add(1, Ordering::Relaxed) + 1;
                if successes >= u64::from(self.config.success_threshold) {
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    pub fn record_failure_manual(&self, duration: Duration) {

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation failed"
        );

        match self.state() {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures >= u64::from(self.config.failure_threshold) {
                    self.transition_to_open();
                }
            }
            // Any failure while probing reopens immediately
            CircuitState::HalfOpen => self.transition_to_open(),
            CircuitState::Open => {}
        }
    }

    fn now_millis(&self) -> u64 {
        self.clock.now().timestamp_millis().max(1) as u64
    }

    fn transition_to_closed(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.opened_at_millis.store(0, Ordering::Release);
        self.state.store(CircuitState::Closed as u8, Ordering::Release);

        info!(component = %self.name, "Circuit breaker closed (recovered)");
    }

    fn transition_to_open(&self) {
        self.opened_at_millis.store(self.now_millis(), Ordering::Release);
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        error!(
            component = %self.name,
            consecutive_failures = self.consecutive_failures.load(Ordering::Relaxed),
            failure_threshold = self.config.failure_threshold,
            timeout_seconds = self.config.timeout.as_secs(),
            "Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self) {
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.state.store(CircuitState::HalfOpen as u8, Ordering::Release);

        info!(component = %self.name, "Circuit breaker half-open (testing recovery)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn breaker(clock: &ManualClock) -> CircuitBreaker {
        CircuitBreaker::with_clock(
            "test",
            CircuitBreakerConfig {
                failure_threshold: 3,
                timeout: Duration::from_secs(30),
                success_threshold: 1,
            },
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn test_opens_after_threshold() {
        let clock = ManualClock::default();
        let circuit = breaker(&clock);
        assert_eq!(circuit.state(), CircuitState::Closed);

        circuit.record_failure_manual(Duration::ZERO);
        circuit.record_failure_manual(Duration::ZERO);
        assert!(circuit.should_allow());

        circuit.record_failure_manual(Duration::ZERO);
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.should_allow());
    }

    fn trip(circuit: &CircuitBreaker) {
        for _ in 0..3 {
            circuit.record_failure_manual(Duration::ZERO);
        }
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let clock = ManualClock::default();
        let circuit = breaker(&clock);

        circuit.record_failure_manual(Duration::ZERO);
        circuit.record_failure_manual(Duration::ZERO);
        circuit.record_success_manual(Duration::ZERO);
        circuit.record_failure_manual(Duration::ZERO);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn test_recovery_through_half_open() {
        let clock = ManualClock::default();
        let circuit = breaker(&clock);
        trip(&circuit);
        assert!(!circuit.should_allow());

        clock.advance(chrono::Duration::seconds(31));
        assert!(circuit.should_allow());
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        circuit.record_success_manual(Duration::ZERO);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let clock = ManualClock::default();
        let circuit = breaker(&clock);
        trip(&circuit);

        clock.advance(chrono::Duration::seconds(31));
        assert!(circuit.should_allow());
        circuit.record_failure_manual(Duration::ZERO);
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.should_allow());
    }
}

//! Shared (tier-2) cache with integrated circuit breaker
//!
//! Enum dispatch over the concrete backends. The circuit breaker is internal:
//! while open, `get()` returns `Ok(None)`, `set()` returns `Ok(())` and
//! `delete_pattern()` returns `Ok(0)`, so an unavailable backend costs one
//! failed call per recovery window instead of one per request.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::errors::CacheResult;
use super::providers::{InMemorySharedCache, NoOpCacheService};
use super::traits::SharedCacheService;
use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheService;

#[derive(Debug, Clone)]
enum SharedBackend {
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheService>),
    InMemory(InMemorySharedCache),
    NoOp(NoOpCacheService),
}

impl SharedBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            Self::InMemory(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            Self::InMemory(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set(key, value, ttl).await,
            Self::InMemory(s) => s.set(key, value, ttl).await,
            Self::NoOp(s) => s.set(key, value, ttl).await,
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete_pattern(pattern).await,
            Self::InMemory(s) => s.delete_pattern(pattern).await,
            Self::NoOp(s) => s.delete_pattern(pattern).await,
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            Self::InMemory(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }
}

#[derive(Clone)]
pub struct SharedCacheTier {
    backend: SharedBackend,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl std::fmt::Debug for SharedCacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCacheTier")
            .field("backend", &self.backend)
            .field(
                "circuit_breaker",
                &self.circuit_breaker.as_ref().map(|cb| cb.state()),
            )
            .finish()
    }
}

impl SharedCacheTier {
    /// Build the shared tier from configuration.
    ///
    /// Never fails: a backend that cannot be reached at startup degrades to
    /// the no-op provider with a warning.
    pub async fn from_config_graceful(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let backend = Self::create_backend(config, clock.clone()).await;

        let circuit_breaker = backend.is_enabled().then(|| {
            Arc::new(CircuitBreaker::with_clock(
                "shared_cache",
                Self::breaker_config(config),
                clock,
            ))
        });

        Self {
            backend,
            circuit_breaker,
        }
    }

    async fn create_backend(config: &CacheConfig, clock: Arc<dyn Clock>) -> SharedBackend {
        if !config.enabled {
            info!("Shared cache disabled by configuration");
            return SharedBackend::NoOp(NoOpCacheService::new());
        }

        match config.backend.as_str() {
            "redis" => Self::create_redis_backend(config).await,
            "memory" | "in-memory" => {
                info!(backend = "in_memory", "Shared cache tier is process-local");
                SharedBackend::InMemory(InMemorySharedCache::new(clock))
            }
            "none" | "noop" => SharedBackend::NoOp(NoOpCacheService::new()),
            other => {
                warn!(backend = other, "Unknown cache backend, falling back to NoOp");
                SharedBackend::NoOp(NoOpCacheService::new())
            }
        }
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> SharedBackend {
        let Some(url) = config.redis_url.as_deref() else {
            warn!("Redis cache enabled but no redis_url configured, falling back to NoOp");
            return SharedBackend::NoOp(NoOpCacheService::new());
        };

        match RedisCacheService::connect(url, &config.key_prefix).await {
            Ok(service) => {
                info!(backend = "redis", "Shared cache provider initialized");
                SharedBackend::Redis(Box::new(service))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to connect to Redis, falling back to NoOp cache (graceful degradation)"
                );
                SharedBackend::NoOp(NoOpCacheService::new())
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> SharedBackend {
        warn!("Redis cache backend requested but 'cache-redis' feature not enabled, using NoOp");
        SharedBackend::NoOp(NoOpCacheService::new())
    }

    fn breaker_config(config: &CacheConfig) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: config.failure_threshold,
            timeout: Duration::from_secs(config.recovery_timeout_seconds),
            success_threshold: 1,
        }
    }

    /// Shared tier that never stores anything
    pub fn noop() -> Self {
        Self {
            backend: SharedBackend::NoOp(NoOpCacheService::new()),
            circuit_breaker: None,
        }
    }

    /// Shared tier over an in-memory backend, guarded by a circuit breaker
    pub fn in_memory(
        cache: InMemorySharedCache,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend: SharedBackend::InMemory(cache),
            circuit_breaker: Some(Arc::new(CircuitBreaker::with_clock(
                "shared_cache",
                Self::breaker_config(config),
                clock,
            ))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.circuit_breaker.as_ref().map(|cb| cb.state())
    }

    fn record(cb: &CircuitBreaker, ok: bool, duration: Duration) {
        if ok {
            cb.record_success_manual(duration);
        } else {
            cb.record_failure_manual(duration);
        }
    }

    /// Read a value; an open circuit is a miss
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let Some(cb) = &self.circuit_breaker else {
            return self.backend.get(key).await;
        };

        if !cb.should_allow() {
            debug!(key = key, "Shared cache circuit open, returning miss");
            return Ok(None);
        }

        let start = Instant::now();
        let result = self.backend.get(key).await;
        Self::record(cb, result.is_ok(), start.elapsed());
        result
    }

    /// Write a value; skipped while the circuit is open
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let Some(cb) = &self.circuit_breaker else {
            return self.backend.set(key, value, ttl).await;
        };

        if !cb.should_allow() {
            debug!(key = key, "Shared cache circuit open, skipping set");
            return Ok(());
        }

        let start = Instant::now();
        let result = self.backend.set(key, value, ttl).await;
        Self::record(cb, result.is_ok(), start.elapsed());
        result
    }

    pub async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let Some(cb) = &self.circuit_breaker else {
            return self.backend.delete_pattern(pattern).await;
        };

        if !cb.should_allow() {
            debug!(pattern = pattern, "Shared cache circuit open, skipping delete_pattern");
            return Ok(0);
        }

        let start = Instant::now();
        let result = self.backend.delete_pattern(pattern).await;
        Self::record(cb, result.is_ok(), start.elapsed());
        result
    }

    /// An open circuit reports unhealthy without touching the backend
    pub async fn health_check(&self) -> CacheResult<bool> {
        let Some(cb) = &self.circuit_breaker else {
            return self.backend.health_check().await;
        };

        if !cb.should_allow() {
            return Ok(false);
        }

        let start = Instant::now();
        let result = self.backend.health_check().await;
        Self::record(cb, matches!(result, Ok(true)), start.elapsed());
        result
    }
}

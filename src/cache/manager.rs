//! # Cache Manager
//!
//! Two-tier read-through cache. Tier 1 is the process-local [`LocalCache`],
//! tier 2 the [`SharedCacheTier`]. A tier-2 failure is logged and treated as a
//! miss; it never fails the lookup.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::errors::{CacheError, CacheResult};
use super::local::LocalCache;
use super::shared::SharedCacheTier;
use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::resilience::CircuitState;

/// Tier-1 contents as reported by the `cache_stats` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub keys: Vec<String>,
    pub shared_provider: String,
}

/// Entries removed by [`CacheManager::clear_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearSummary {
    pub local_entries: usize,
    pub shared_keys: u64,
}

#[derive(Debug, Clone)]
pub struct CacheManager {
    local: LocalCache,
    shared: SharedCacheTier,
    key_prefix: String,
    namespaces: Vec<String>,
    default_ttl: Duration,
}

impl CacheManager {
    pub fn new(config: &CacheConfig, shared: SharedCacheTier, clock: Arc<dyn Clock>) -> Self {
        Self {
            local: LocalCache::new(clock),
            shared,
            key_prefix: config.key_prefix.clone(),
            namespaces: config.namespaces.clone(),
            default_ttl: config.default_ttl(),
        }
    }

    pub fn shared(&self) -> &SharedCacheTier {
        &self.shared
    }

    /// Tier-2 key for a `namespace:name` cache key
    pub fn shared_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    /// Return the cached value for `key`, calling `fetcher` on a miss in both tiers.
    ///
    /// `key` is `namespace:name`. `ttl` defaults to the configured TTL.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(data) = self.local.get(key) {
            match serde_json::from_value::<T>(data) {
                Ok(value) => {
                    debug!(key = key, "Tier-1 cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(key = key, error = %e, "Discarding undecodable tier-1 entry"),
            }
        }

        let shared_key = self.shared_key(key);
        match self.shared.get(&shared_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(data) => match serde_json::from_value::<T>(data.clone()) {
                    Ok(value) => {
                        debug!(key = key, "Tier-2 cache hit");
                        self.local.set(key, data, ttl);
                        return Ok(value);
                    }
                    Err(e) => warn!(key = key, error = %e, "Discarding undecodable tier-2 entry"),
                },
                Err(e) => warn!(key = key, error = %e, "Discarding malformed tier-2 entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = key, error = %e, "⚠️ Shared cache unavailable, continuing"),
        }

        let value = fetcher().await?;
        let data = serde_json::to_value(&value).map_err(CacheError::from)?;

        if let Err(e) = self.shared.set(&shared_key, &data.to_string(), ttl).await {
            warn!(key = key, error = %e, "⚠️ Failed to populate shared cache");
        }
        self.local.set(key, data, ttl);

        Ok(value)
    }

    /// Wipe tier 1 and every configured tier-2 namespace
    pub async fn clear_all(&self) -> CacheResult<ClearSummary> {
        let local_entries = self.local.clear();
        let mut shared_keys = 0;

        for namespace in &self.namespaces {
            let pattern = format!("{}:{}:*", self.key_prefix, namespace);
            shared_keys += self.shared.delete_pattern(&pattern).await?;
        }

        Ok(ClearSummary {
            local_entries,
            shared_keys,
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.local.len(),
            keys: self.local.keys(),
            shared_provider: self.shared.provider_name().to_string(),
        }
    }

    /// Time a write/read round trip through each tier.
    ///
    /// Returns one operation line per tier. Tier 2 only counts as healthy when
    /// it hands back the value just written; an open circuit, an error or a
    /// lost write are all reported as "failed". The probe key is removed from
    /// both tiers afterwards.
    pub async fn performance_test(&self) -> Vec<String> {
        let key = format!("perf_test:{}", uuid::Uuid::new_v4().simple());
        let probe = serde_json::json!({"probe": true});
        let ttl = Duration::from_secs(60);

        let start = Instant::now();
        self.local.set(&key, probe.clone(), ttl);
        let local_ok = self.local.get(&key).as_ref() == Some(&probe);
        let local_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.local.remove(&key);

        let tier1 = if local_ok {
            format!("Tier-1 cache round trip: {local_ms:.3}ms")
        } else {
            "Tier-1 cache round trip: failed".to_string()
        };

        vec![tier1, self.probe_shared_tier(&key, &probe.to_string(), ttl).await]
    }

    async fn probe_shared_tier(&self, key: &str, value: &str, ttl: Duration) -> String {
        let provider = self.shared.provider_name();
        if !self.shared.is_enabled() {
            return format!("Tier-2 cache ({provider}) round trip: skipped (disabled)");
        }
        if self.shared.circuit_state() == Some(CircuitState::Open) {
            warn!(provider = provider, "Tier-2 cache circuit open, skipping performance probe");
            return format!("Tier-2 cache ({provider}) round trip: failed");
        }

        let shared_key = self.shared_key(key);
        let start = Instant::now();
        let outcome = async {
            self.shared.set(&shared_key, value, ttl).await?;
            self.shared.get(&shared_key).await
        }
        .await;
        let shared_ms = start.elapsed().as_secs_f64() * 1000.0;

        let line = match outcome {
            Ok(Some(read)) if read == value => {
                format!("Tier-2 cache ({provider}) round trip: {shared_ms:.3}ms")
            }
            Ok(_) => {
                warn!(provider = provider, "Tier-2 cache did not return the probe value");
                format!("Tier-2 cache ({provider}) round trip: failed")
            }
            Err(e) => {
                warn!(error = %e, "Tier-2 cache performance probe failed");
                return format!("Tier-2 cache ({provider}) round trip: failed");
            }
        };

        if let Err(e) = self.shared.delete_pattern(&shared_key).await {
            warn!(key = %shared_key, error = %e, "Failed to remove tier-2 probe key");
        }
        line
    }
}

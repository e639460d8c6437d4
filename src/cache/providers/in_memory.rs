//! In-memory shared cache provider
//!
//! Stands in for an external cache in tests and single-process runs. Expiry
//! follows the injected clock, and the backend can be switched to
//! "unreachable" to exercise graceful degradation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::SharedCacheService;
use crate::clock::Clock;

#[derive(Debug, Clone)]
pub struct InMemorySharedCache {
    entries: Arc<DashMap<String, (String, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
    unreachable: Arc<AtomicBool>,
}

impl InMemorySharedCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
            unreachable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every operation fail with a backend error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Stored keys, expired or not (for testing)
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    fn check_reachable(&self) -> CacheResult<()> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(CacheError::BackendError(
                "shared cache unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Glob match supporting `*` wildcards
fn matches_pattern(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

impl SharedCacheService for InMemorySharedCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_reachable()?;
        let now = self.clock.now();

        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.value().1 > now)
            .map(|entry| entry.value().0.clone());

        if hit.is_none() {
            self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(hit)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check_reachable()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::BackendError(e.to_string()))?;
        let expires_at = self.clock.now() + ttl;
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.check_reachable()?;
        let before = self.entries.len();
        self.entries.retain(|key, _| !matches_pattern(pattern, key));
        Ok((before - self.entries.len()) as u64)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        self.check_reachable()?;
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

//! Shared cache tier trait definition

use super::errors::CacheResult;
use std::time::Duration;

/// Operations of an external (tier-2) cache backend.
///
/// Values are opaque strings; the [`CacheManager`](super::CacheManager) owns
/// serialization and key layout.
pub trait SharedCacheService: Send + Sync {
    /// `Ok(Some(value))` on hit, `Ok(None)` on miss
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Delete all keys matching a glob pattern, returning the number removed
    fn delete_pattern(
        &self,
        pattern: &str,
    ) -> impl std::future::Future<Output = CacheResult<u64>> + Send;

    fn health_check(&self) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    fn provider_name(&self) -> &'static str;
}

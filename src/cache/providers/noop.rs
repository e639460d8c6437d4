//! No-op shared cache provider
//!
//! Always misses, always succeeds. Used when the shared tier is disabled or
//! its backend could not be reached at startup.

use crate::cache::errors::CacheResult;
use crate::cache::traits::SharedCacheService;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct NoOpCacheService;

impl NoOpCacheService {
    pub fn new() -> Self {
        Self
    }
}

impl SharedCacheService for NoOpCacheService {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_always_misses() {
        let svc = NoOpCacheService::new();
        svc.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(svc.get("k").await.unwrap(), None);
        assert_eq!(svc.delete_pattern("farm:*").await.unwrap(), 0);
        assert!(svc.health_check().await.unwrap());
    }
}

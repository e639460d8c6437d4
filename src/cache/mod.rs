//! # Two-Tier Cache
//!
//! Read-through caching for expensive external fetches. Staleness is bounded
//! only by TTL; there is no cross-instance invalidation.

pub mod errors;
pub mod local;
pub mod manager;
pub mod providers;
pub mod shared;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use local::LocalCache;
pub use manager::{CacheManager, CacheStats, ClearSummary};
pub use providers::{InMemorySharedCache, NoOpCacheService};
pub use shared::SharedCacheTier;
pub use traits::SharedCacheService;

#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheService;

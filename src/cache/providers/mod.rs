//! Shared cache tier providers.

mod in_memory;
mod noop;
#[cfg(feature = "cache-redis")]
mod redis;

pub use self::in_memory::InMemorySharedCache;
pub use self::noop::NoOpCacheService;
#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCacheService;

//! # Processor Constants
//!
//! Operational defaults for queue draining, caching, freshness checks and
//! monitoring thresholds. Every value here can be overridden through
//! [`crate::config::ProcessorConfig`].

/// Default queue names, one per priority tier, plus the dead-letter queue.
pub mod queues {
    pub const CRITICAL: &str = "automation_critical";
    pub const HIGH: &str = "automation_high";
    pub const NORMAL: &str = "automation_normal";
    pub const LOW: &str = "automation_low";
    pub const DEAD_LETTER: &str = "automation_dead_letter";
}

/// Messages read from each tier per invocation
pub const DEFAULT_QUEUE_BATCH_SIZE: u32 = 10;

/// Lease duration of a read message before it becomes visible again
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u32 = 30;

/// Failed deliveries tolerated before a message is dead-lettered
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Time-to-live of a cache entry in both tiers
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Prefix applied to every shared-tier cache key
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "farm";

/// Shared-tier namespaces wiped by a cache clear
pub const DEFAULT_CACHE_NAMESPACES: &[&str] = &["device_states", "sensor_data", "schedules"];

/// Mutation count across watched tables above which derived views are refreshed
pub const DEFAULT_REFRESH_THRESHOLD: u64 = 100;

/// Tables whose insert/update/delete counters feed the refresh heuristic
pub const DEFAULT_WATCHED_TABLES: &[&str] = &[
    "sensor_readings",
    "schedules",
    "device_assignments",
    "shelves",
    "device_states",
];

/// Window in which a sensor must have reported to count as responsive
pub const DEFAULT_RESPONSIVENESS_WINDOW_MINUTES: u32 = 120;

/// Completion percentage at which a schedule is ready for harvest
pub const DEFAULT_HARVEST_READY_PERCENTAGE: f64 = 95.0;

/// Records older than this are removed by the cleanup task
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Device gateway request timeout
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 10_000;

/// Name under which invocations are recorded in the performance log
pub const DEFAULT_FUNCTION_NAME: &str = "automation-processor";

/// Cache key (within the `device_states` namespace) holding the gateway state snapshot
pub const GATEWAY_STATES_CACHE_KEY: &str = "device_states:all";

/// Entity-id prefixes of devices the gateway can control
pub const CONTROLLABLE_DOMAINS: &[&str] = &["light.", "switch.", "fan.", "input_boolean."];

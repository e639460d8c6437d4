//! # Processor Configuration
//!
//! Typed configuration for every component of the automation processor.
//!
//! ## TOML Structure
//!
//! ```toml
//! [database]
//! [queues]
//! [cache]
//! [freshness]
//! [monitoring]
//! [gateway]
//! [maintenance]
//! [performance]
//! ```
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Values are validated with the `validator` crate after
//! loading; see [`ConfigLoader`].

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::constants;
use crate::models::PriorityTier;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessorConfig {
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub queues: QueuesConfig,
    #[validate(nested)]
    pub cache: CacheConfig,
    #[validate(nested)]
    pub freshness: FreshnessConfig,
    #[validate(nested)]
    pub monitoring: MonitoringConfig,
    #[validate(nested)]
    pub gateway: GatewayConfig,
    #[validate(nested)]
    pub maintenance: MaintenanceConfig,
    #[validate(nested)]
    pub performance: PerformanceConfig,
}

/// Datastore connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; empty means "not configured"
    pub url: String,

    #[validate(range(min = 1, max = 1000))]
    pub max_connections: u32,

    #[validate(range(min = 1, max = 300))]
    pub acquire_timeout_seconds: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            acquire_timeout_seconds: 10,
        }
    }
}

/// Priority queue names and draining behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueuesConfig {
    #[validate(length(min = 1))]
    pub critical: String,
    #[validate(length(min = 1))]
    pub high: String,
    #[validate(length(min = 1))]
    pub normal: String,
    #[validate(length(min = 1))]
    pub low: String,
    #[validate(length(min = 1))]
    pub dead_letter: String,

    /// Messages read per tier per invocation
    #[validate(range(min = 1, max = 1000))]
    pub batch_size: u32,

    /// Lease duration of a read message (seconds)
    #[validate(range(min = 1, max = 3600))]
    pub visibility_timeout_seconds: u32,

    /// Failed deliveries tolerated before dead-lettering
    #[validate(range(min = 1, max = 100))]
    pub max_retries: u32,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            critical: constants::queues::CRITICAL.to_string(),
            high: constants::queues::HIGH.to_string(),
            normal: constants::queues::NORMAL.to_string(),
            low: constants::queues::LOW.to_string(),
            dead_letter: constants::queues::DEAD_LETTER.to_string(),
            batch_size: constants::DEFAULT_QUEUE_BATCH_SIZE,
            visibility_timeout_seconds: constants::DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
            max_retries: constants::DEFAULT_MAX_RETRIES,
        }
    }
}

impl QueuesConfig {
    /// Queue name backing a priority tier
    pub fn queue_for(&self, tier: PriorityTier) -> &str {
        match tier {
            PriorityTier::Critical => &self.critical,
            PriorityTier::High => &self.high,
            PriorityTier::Normal => &self.normal,
            PriorityTier::Low => &self.low,
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.visibility_timeout_seconds))
    }
}

/// Two-tier cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the shared (tier-2) cache
    pub enabled: bool,

    /// Shared tier backend: "redis", "memory" or "none"
    #[validate(length(min = 1))]
    pub backend: String,

    /// Redis connection URL for the "redis" backend
    pub redis_url: Option<String>,

    #[validate(range(min = 1, max = 86400))]
    pub default_ttl_seconds: u64,

    #[validate(length(min = 1))]
    pub key_prefix: String,

    /// Shared-tier namespaces removed by a cache clear
    pub namespaces: Vec<String>,

    /// Consecutive shared-tier failures before the circuit opens
    #[validate(range(min = 1, max = 100))]
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before probing again
    #[validate(range(min = 1, max = 300))]
    pub recovery_timeout_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "none".to_string(),
            redis_url: None,
            default_ttl_seconds: constants::DEFAULT_CACHE_TTL_SECONDS,
            key_prefix: constants::DEFAULT_CACHE_KEY_PREFIX.to_string(),
            namespaces: constants::DEFAULT_CACHE_NAMESPACES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            failure_threshold: 3,
            recovery_timeout_seconds: 30,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// Derived-view refresh heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Summed mutations above which views are refreshed
    pub refresh_threshold: u64,

    #[validate(length(min = 1))]
    pub watched_tables: Vec<String>,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            refresh_threshold: constants::DEFAULT_REFRESH_THRESHOLD,
            watched_tables: constants::DEFAULT_WATCHED_TABLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Sensor and schedule monitoring thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MonitoringConfig {
    #[validate(range(min = 1, max = 10080))]
    pub responsiveness_window_minutes: u32,

    #[validate(range(min = 0.0, max = 100.0))]
    pub harvest_ready_percentage: f64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            responsiveness_window_minutes: constants::DEFAULT_RESPONSIVENESS_WINDOW_MINUTES,
            harvest_ready_percentage: constants::DEFAULT_HARVEST_READY_PERCENTAGE,
        }
    }
}

/// External device gateway connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the home-automation API; unset disables sync and discovery
    #[validate(url)]
    pub base_url: Option<String>,

    /// Long-lived bearer token
    pub access_token: Option<String>,

    #[validate(range(min = 100, max = 120000))]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            access_token: None,
            timeout_ms: constants::DEFAULT_GATEWAY_TIMEOUT_MS,
        }
    }
}

impl GatewayConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Housekeeping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MaintenanceConfig {
    #[validate(range(min = 1, max = 3650))]
    pub retention_days: u32,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            retention_days: constants::DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Performance log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PerformanceConfig {
    #[validate(length(min = 1))]
    pub function_name: String,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            function_name: constants::DEFAULT_FUNCTION_NAME.to_string(),
        }
    }
}

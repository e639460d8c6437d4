#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Farm Automation
//!
//! Automation task processor for a vertical farm. One invocation drains the
//! priority task queues, keeps device state in sync with the home-automation
//! gateway, watches sensors and grow schedules for problems, and drives the
//! shelf climate devices from the latest readings.
//!
//! ## Architecture
//!
//! An invocation is a single sequential flow owned by [`TaskProcessor`]:
//!
//! ```text
//! request -> queue drain -> view refresh -> {sync, monitor, control} -> performance log
//! ```
//!
//! Every component records into the invocation's
//! [`ProcessingResult`](models::ProcessingResult). Partial failure is reported
//! through its `errors` list while `success` stays true; only a malformed
//! request fails the invocation.
//!
//! ## Module Organization
//!
//! - [`processor`] - Invocation dispatcher
//! - [`services`] - Queue consumer, handlers, monitor, control engine, sync, maintenance
//! - [`messaging`] - Priority queue abstraction (pgmq and in-memory)
//! - [`cache`] - Two-tier read-through cache
//! - [`database`] - Datastore abstraction over the summary views and RPCs
//! - [`gateway`] - Device gateway HTTP client
//! - [`resilience`] - Circuit breaker guarding the shared cache tier
//! - [`config`] - Configuration loading and validation
//! - [`models`] - Request, result, message and domain types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use farm_automation::cache::SharedCacheTier;
//! use farm_automation::clock::system_clock;
//! use farm_automation::config::ProcessorConfig;
//! use farm_automation::database::InMemoryDatastore;
//! use farm_automation::messaging::InMemoryQueueService;
//! use farm_automation::{ProcessorDependencies, TaskProcessor};
//!
//! # async fn example() {
//! let processor = TaskProcessor::new(
//!     &ProcessorConfig::default(),
//!     ProcessorDependencies {
//!         datastore: Arc::new(InMemoryDatastore::new()),
//!         queue: Arc::new(InMemoryQueueService::new()),
//!         gateway: None,
//!         shared_cache: SharedCacheTier::noop(),
//!         clock: system_clock(),
//!     },
//! );
//!
//! let result = processor
//!     .invoke(&serde_json::json!({"task_type": "schedule_automation"}))
//!     .await;
//! println!("processed {} items", result.processed_count);
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod processor;
pub mod resilience;
pub mod services;

pub use config::{ConfigLoader, ProcessorConfig};
pub use error::{ProcessorError, ProcessorResult};
pub use models::{InvocationRequest, ProcessingResult, TaskKind};
pub use processor::{ProcessorDependencies, TaskProcessor};

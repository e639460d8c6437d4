//! # Messaging Module
//!
//! Priority task queues. PostgreSQL (pgmq) in production, an in-memory
//! provider for tests and local runs.

pub mod errors;
pub mod providers;
pub mod service;

pub use errors::MessagingError;
pub use providers::{InMemoryQueueService, PgmqQueueService};
pub use service::{QueueService, QueuedMessage};

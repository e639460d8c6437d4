//! # Queue Service Providers
//!
//! - [`PgmqQueueService`] - PostgreSQL message queue via the pgmq crate
//! - [`InMemoryQueueService`] - in-memory queues for tests and local runs

mod in_memory;
mod pgmq;

pub use self::in_memory::InMemoryQueueService;
pub use self::pgmq::PgmqQueueService;

//! # Domain Models
//!
//! Data carried through one processor invocation: the request and result
//! envelopes, queue task messages, read-only summaries produced by the
//! datastore's derived views, alerts, and device commands/states.

pub mod alert;
pub mod device;
pub mod request;
pub mod result;
pub mod summary;
pub mod task_message;

pub use alert::{AlertSeverity, AlertType, NewAlert};
pub use device::{DeviceAction, DeviceCommand, DeviceType, DiscoveredDevice, EntityState};
pub use request::{CacheOperation, InvocationRequest, TaskKind};
pub use result::{PerformanceLogEntry, ProcessingResult};
pub use summary::{ActiveScheduleSummary, SensorReading, SensorSummary, TableMutationStats};
pub use task_message::{DeadLetterRecord, PriorityTier, QueueTaskType, TaskMessage};

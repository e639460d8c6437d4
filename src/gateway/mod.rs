//! # Device Gateway
//!
//! Access to the external home-automation API. Every call is best-effort;
//! callers turn failures into result errors instead of propagating them.

pub mod client;
pub mod errors;
pub mod in_memory;

pub use client::{service_call_body, DeviceGateway, HttpDeviceGateway};
pub use errors::GatewayError;
pub use in_memory::{ExecutedCall, InMemoryDeviceGateway};

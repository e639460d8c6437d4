//! # Database Operations
//!
//! The [`Datastore`] trait is the processor's only view of the relational
//! store. [`PgDatastore`] implements it over sqlx with runtime-checked
//! queries; [`InMemoryDatastore`] backs tests.

pub mod connection;
pub mod datastore;
pub mod in_memory;
pub mod postgres;

pub use connection::DatabaseConnection;
pub use datastore::Datastore;
pub use in_memory::InMemoryDatastore;
pub use postgres::PgDatastore;

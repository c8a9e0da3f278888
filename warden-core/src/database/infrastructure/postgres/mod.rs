//! PostgreSQL adapters for the storage ports.

pub mod users;

pub use users::{PostgresUserScope, PostgresUserStorage};

//! Storage collaborator: the ports the user store depends on and the
//! adapters that implement them.
//!
//! - [`ports`]: the `UserStorage` / `UserScope` contract
//! - [`in_memory`]: process-local storage with transactional scopes
//! - [`postgres`]: pool bootstrap and migrations (feature `database`)
//! - [`infrastructure`]: SQL adapters for the ports (feature `database`)

pub mod in_memory;
pub mod infrastructure;
pub mod ports;

#[cfg(feature = "database")]
pub mod postgres;

pub use in_memory::InMemoryUserStorage;
#[cfg(feature = "database")]
pub use infrastructure::postgres::PostgresUserStorage;
#[cfg(feature = "database")]
pub use postgres::{PoolSettings, PostgresDatabase};

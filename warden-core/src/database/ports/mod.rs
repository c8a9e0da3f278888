//! Storage ports consumed by the domain layer.

pub mod users;

pub use users::{UserScope, UserStorage};

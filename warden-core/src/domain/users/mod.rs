//! User records, their lifecycle rules, and the credential and token
//! primitives.

pub mod auth;
pub mod store;
pub mod user;

pub use store::{UserStore, UserStoreError};
pub use user::{NewUser, UserPatch, UserRecord};

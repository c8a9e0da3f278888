//! Application services composing the domain layer with a storage handle.

pub mod account_service;

pub use account_service::{AccountError, AccountService, TokenPair};

//! # Warden Core
//!
//! Core library for Warden, a minimal user-account backend: password
//! hashing, signed expiring bearer tokens, and a user store that keeps email
//! addresses unique.
//!
//! ## Overview
//!
//! - **Credential Hasher**: Argon2id hashing with per-hash random salts
//! - **Token Service**: HMAC-signed JWTs carrying arbitrary claims plus `exp`
//! - **User Store**: create/read/update/delete of user records by email
//! - **Storage Scopes**: every store operation runs in a transactional scope
//!   supplied by the storage collaborator (Postgres or in-memory)
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL/SQLx adapter and embedded migrations (default)
//! - `postgres-tests`: enables the Postgres integration tests
//!
//! ## Architecture
//!
//! - [`domain`]: records, lifecycle rules, hashing and tokens
//! - [`database`]: storage ports and adapters
//! - [`application`]: scoped account operations and login
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_core::{
//!     AccountService, CredentialHasher, InMemoryUserStorage, TokenService,
//!     TokenSettings, UserStore,
//! };
//!
//! async fn register() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokens = TokenService::new(TokenSettings::new("secret", "HS256"))?;
//!     let store = UserStore::new(Arc::new(CredentialHasher::new()?));
//!     let accounts =
//!         AccountService::new(InMemoryUserStorage::new(), store, Arc::new(tokens));
//!
//!     accounts.create_user("alice@example.com", "correct horse").await?;
//!     let pair = accounts.login("alice@example.com", "correct horse").await?;
//!     assert!(pair.is_some());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod application;
pub mod database;
pub mod domain;

/// Error types and error handling utilities
pub mod error;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use application::{AccountError, AccountService, TokenPair};
pub use database::InMemoryUserStorage;
#[cfg(feature = "database")]
pub use database::{PoolSettings, PostgresDatabase, PostgresUserStorage};
pub use database::ports::{UserScope, UserStorage};
pub use domain::users::auth::{
    Claims, ConfigurationError, CredentialHasher, CryptoError, InvalidToken,
    TokenError, TokenService, TokenSettings,
};
pub use domain::users::{UserPatch, UserRecord, UserStore, UserStoreError};
pub use error::StorageError;

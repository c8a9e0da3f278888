use thiserror::Error;

/// Faults raised by the storage collaborator.
///
/// Only [`StorageError::UniqueEmail`] is an expected condition; the user store
/// folds it into its duplicate-email rejection. Everything else is a storage
/// fault that rolls the surrounding scope back and propagates unchanged.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("email already registered: {0}")]
    UniqueEmail(String),

    #[error("user record {0} no longer exists")]
    MissingRecord(i64),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

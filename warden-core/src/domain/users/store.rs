//! User-record lifecycle rules.
//!
//! Every operation runs against a caller-supplied [`UserScope`] and never
//! commits it: the caller decides whether the scope's changes persist.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::database::ports::users::UserScope;
use crate::domain::users::auth::crypto::{CredentialHasher, CryptoError};
use crate::domain::users::user::{NewUser, UserPatch, UserRecord};
use crate::error::StorageError;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user with email {0} already exists")]
    DuplicateEmail(String),
    #[error(transparent)]
    Hashing(#[from] CryptoError),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for UserStoreError {
    fn from(err: StorageError) -> Self {
        match err {
            // The storage-level uniqueness constraint backs up the
            // read-then-write check below.
            StorageError::UniqueEmail(email) => UserStoreError::DuplicateEmail(email),
            other => UserStoreError::Storage(other),
        }
    }
}

/// CRUD over user records, keyed by email.
#[derive(Debug, Clone)]
pub struct UserStore {
    hasher: Arc<CredentialHasher>,
}

impl UserStore {
    pub fn new(hasher: Arc<CredentialHasher>) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Register a new account. Fails with `DuplicateEmail` if the email is
    /// already in use.
    pub async fn create<S: UserScope>(
        &self,
        scope: &mut S,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, UserStoreError> {
        if scope.find_by_email(email).await?.is_some() {
            return Err(UserStoreError::DuplicateEmail(email.to_string()));
        }

        let hashed_password = self.hasher.hash(password)?;
        let record = scope
            .insert(NewUser {
                email: email.to_string(),
                hashed_password,
            })
            .await?;

        info!(user_id = record.id, "Created user");
        Ok(record)
    }

    pub async fn get_by_email<S: UserScope>(
        &self,
        scope: &mut S,
        email: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(scope.find_by_email(email).await?)
    }

    /// Apply `patch` to the record owning `email`. Returns `None` when no such
    /// record exists.
    pub async fn update<S: UserScope>(
        &self,
        scope: &mut S,
        email: &str,
        patch: &UserPatch,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let Some(mut user) = scope.find_by_email(email).await? else {
            debug!(email, "update skipped: no such user");
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(user));
        }

        if let Some(new_email) = patch.provided_email() {
            if scope
                .find_other_by_email(new_email, user.id)
                .await?
                .is_some()
            {
                return Err(UserStoreError::DuplicateEmail(new_email.to_string()));
            }
            user.email = new_email.to_string();
        }

        if let Some(password) = patch.provided_password() {
            user.hashed_password = self.hasher.hash(password)?;
        }

        if let Some(refresh_token) = patch.provided_refresh_token() {
            user.refresh_token = Some(refresh_token.to_string());
        }

        scope.save(&user).await?;
        info!(user_id = user.id, "Updated user");
        Ok(Some(user))
    }

    /// Remove the record owning `email`, returning it as it was before
    /// removal.
    pub async fn delete<S: UserScope>(
        &self,
        scope: &mut S,
        email: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let Some(user) = scope.find_by_email(email).await? else {
            return Ok(None);
        };

        scope.remove(user.id).await?;
        info!(user_id = user.id, "Deleted user");
        Ok(Some(user))
    }
}

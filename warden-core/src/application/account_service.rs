use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::ports::users::{UserScope, UserStorage};
use crate::domain::users::auth::token::{Claims, TokenError, TokenService};
use crate::domain::users::store::{UserStore, UserStoreError};
use crate::domain::users::user::{UserPatch, UserRecord};
use crate::error::StorageError;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Store(#[from] UserStoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StorageError> for AccountError {
    fn from(err: StorageError) -> Self {
        AccountError::Store(err.into())
    }
}

/// Credentials handed back after a successful login.
#[derive(Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Runs each user-store operation in its own storage scope: commit when the
/// operation returns `Ok`, roll back when it returns `Err`.
#[derive(Debug, Clone)]
pub struct AccountService<S> {
    storage: S,
    store: UserStore,
    tokens: Arc<TokenService>,
}

impl<S: UserStorage> AccountService<S> {
    pub fn new(storage: S, store: UserStore, tokens: Arc<TokenService>) -> Self {
        Self {
            storage,
            store,
            tokens,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Close `scope` according to `result`. The operation's own error wins
    /// over a failed rollback.
    async fn finish<T, E>(scope: S::Scope, result: Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        match result {
            Ok(value) => {
                scope.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = scope.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back scope");
                }
                Err(err)
            }
        }
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, UserStoreError> {
        let mut scope = self.storage.begin().await?;
        let result = self.store.create(&mut scope, email, password).await;
        Self::finish(scope, result).await
    }

    pub async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let mut scope = self.storage.begin().await?;
        let result = self.store.get_by_email(&mut scope, email).await;
        Self::finish(scope, result).await
    }

    pub async fn update_user(
        &self,
        email: &str,
        patch: &UserPatch,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let mut scope = self.storage.begin().await?;
        let result = self.store.update(&mut scope, email, patch).await;
        Self::finish(scope, result).await
    }

    pub async fn delete_user(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        let mut scope = self.storage.begin().await?;
        let result = self.store.delete(&mut scope, email).await;
        Self::finish(scope, result).await
    }

    /// Check an email/password pair. An unknown email and a wrong password
    /// both yield `None`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let user = self.get_user(email).await?;
        Ok(user.filter(|user| self.store.hasher().verify(password, &user.hashed_password)))
    }

    /// Authenticate, then issue an access token (`sub` = email) and store a
    /// fresh refresh token on the record, all in one scope.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<TokenPair>, AccountError> {
        let mut scope = self.storage.begin().await?;
        let result = self.login_in_scope(&mut scope, email, password).await;
        Self::finish(scope, result).await
    }

    async fn login_in_scope(
        &self,
        scope: &mut S::Scope,
        email: &str,
        password: &str,
    ) -> Result<Option<TokenPair>, AccountError> {
        let Some(user) = self.store.get_by_email(&mut *scope, email).await? else {
            return Ok(None);
        };
        if !self.store.hasher().verify(password, &user.hashed_password) {
            return Ok(None);
        }

        let mut claims = Claims::new();
        claims.insert("sub".to_string(), Value::from(user.email.clone()));
        let access_token = self.tokens.issue(&claims, None)?;

        let refresh_token = self.tokens.generate_refresh_token();
        self.store
            .update(
                &mut *scope,
                &user.email,
                &UserPatch::default().refresh_token(refresh_token.clone()),
            )
            .await?;

        info!(user_id = user.id, "User logged in");
        Ok(Some(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
        }))
    }
}

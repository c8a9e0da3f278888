use async_trait::async_trait;

use crate::domain::users::user::{NewUser, UserRecord};
use crate::error::Result;

/// Handle to the storage collaborator: hands out one transactional scope
/// per logical operation.
#[async_trait]
pub trait UserStorage: Send + Sync {
    type Scope: UserScope;

    async fn begin(&self) -> Result<Self::Scope>;
}

/// A unit of storage work over user records.
///
/// Nothing done through a scope is visible to other scopes until
/// [`UserScope::commit`] succeeds. Dropping a scope without committing
/// discards every change made through it.
#[async_trait]
pub trait UserScope: Send {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<UserRecord>>;

    /// Find a record owning `email` other than the one with identity
    /// `exclude_id`.
    async fn find_other_by_email(
        &mut self,
        email: &str,
        exclude_id: i64,
    ) -> Result<Option<UserRecord>>;

    /// Persist a new record, assigning its identity.
    async fn insert(&mut self, user: NewUser) -> Result<UserRecord>;

    /// Overwrite every mutable column of an existing record.
    async fn save(&mut self, user: &UserRecord) -> Result<()>;

    async fn remove(&mut self, id: i64) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

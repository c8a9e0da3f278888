use std::fmt;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use crate::database::ports::users::{UserScope, UserStorage};
use crate::{
    domain::users::user::{NewUser, UserRecord},
    error::{Result, StorageError},
};

const EMAIL_UNIQUE_CONSTRAINT: &str = "user_account_email_key";

/// PostgreSQL-backed implementation of the `UserStorage` port.
#[derive(Clone, Debug)]
pub struct PostgresUserStorage {
    pool: PgPool,
}

impl PostgresUserStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for PostgresUserStorage {
    type Scope = PostgresUserScope;

    async fn begin(&self) -> Result<PostgresUserScope> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUserScope { tx })
    }
}

/// One database transaction. sqlx rolls the transaction back when it is
/// dropped uncommitted.
pub struct PostgresUserScope {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PostgresUserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresUserScope").finish_non_exhaustive()
    }
}

fn map_write_error(err: sqlx::Error, email: &str) -> StorageError {
    if let Some(db_err) = err.as_database_error()
        && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
    {
        return StorageError::UniqueEmail(email.to_string());
    }
    StorageError::Database(err)
}

#[async_trait]
impl UserScope for PostgresUserScope {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, hashed_password, refresh_token
            FROM user_account
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn find_other_by_email(
        &mut self,
        email: &str,
        exclude_id: i64,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, hashed_password, refresh_token
            FROM user_account
            WHERE email = $1 AND id <> $2
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn insert(&mut self, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO user_account (email, hashed_password, refresh_token)
            VALUES ($1, $2, NULL)
            RETURNING id, email, hashed_password, refresh_token
            "#,
        )
        .bind(&user.email)
        .bind(&user.hashed_password)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, &user.email))?;

        debug!(user_id = record.id, "inserted user_account row");
        Ok(record)
    }

    async fn save(&mut self, user: &UserRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_account
            SET email = $2, hashed_password = $3, refresh_token = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.refresh_token)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::MissingRecord(user.id));
        }
        Ok(())
    }

    async fn remove(&mut self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM user_account WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::MissingRecord(id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        info!("Rolled back user_account transaction");
        Ok(())
    }
}

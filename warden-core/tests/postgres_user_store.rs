//! Postgres adapter behaviour. Needs `DATABASE_URL`; run with
//! `--features postgres-tests`.
#![cfg(feature = "postgres-tests")]

use anyhow::Result;
use sqlx::PgPool;
use warden_core::database::PostgresDatabase;
use warden_core::{
    AccountService, StorageError, UserPatch, UserScope, UserStorage, UserStoreError,
};

#[path = "support/mod.rs"]
mod support;
use support::{token_service, user_store};

fn accounts(pool: PgPool) -> AccountService<warden_core::PostgresUserStorage> {
    let database = PostgresDatabase::from_pool(pool);
    AccountService::new(database.users(), user_store(), token_service())
}

#[sqlx::test(migrator = "warden_core::MIGRATOR")]
async fn create_get_update_delete(pool: PgPool) -> Result<()> {
    let accounts = accounts(pool);

    let created = accounts.create_user("a@x.com", "pw").await?;
    assert!(created.id > 0);
    assert_eq!(created.refresh_token, None);

    let fetched = accounts.get_user("a@x.com").await?.expect("created");
    assert_eq!(fetched, created);

    let updated = accounts
        .update_user("a@x.com", &UserPatch::default().password("new"))
        .await?
        .expect("exists");
    assert_eq!(updated.email, "a@x.com");
    assert_ne!(updated.hashed_password, created.hashed_password);

    let deleted = accounts.delete_user("a@x.com").await?.expect("exists");
    assert_eq!(deleted.id, created.id);
    assert!(accounts.get_user("a@x.com").await?.is_none());
    Ok(())
}

#[sqlx::test(migrator = "warden_core::MIGRATOR")]
async fn duplicate_email_is_rejected(pool: PgPool) -> Result<()> {
    let accounts = accounts(pool);
    accounts.create_user("b@x.com", "pw").await?;
    accounts.create_user("c@x.com", "pw").await?;

    let err = accounts.create_user("b@x.com", "pw2").await.unwrap_err();
    assert!(matches!(err, UserStoreError::DuplicateEmail(_)));

    let err = accounts
        .update_user("c@x.com", &UserPatch::default().email("b@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserStoreError::DuplicateEmail(_)));
    Ok(())
}

#[sqlx::test(migrator = "warden_core::MIGRATOR")]
async fn unique_constraint_backs_up_the_check(pool: PgPool) -> Result<()> {
    let storage = PostgresDatabase::from_pool(pool).users();

    let mut scope = storage.begin().await?;
    scope
        .insert(warden_core::domain::users::NewUser {
            email: "d@x.com".into(),
            hashed_password: "hash".into(),
        })
        .await?;
    let err = scope
        .insert(warden_core::domain::users::NewUser {
            email: "d@x.com".into(),
            hashed_password: "hash".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UniqueEmail(_)));
    Ok(())
}

#[sqlx::test(migrator = "warden_core::MIGRATOR")]
async fn dropped_scope_rolls_back(pool: PgPool) -> Result<()> {
    let storage = PostgresDatabase::from_pool(pool.clone()).users();
    {
        let mut scope = storage.begin().await?;
        user_store().create(&mut scope, "e@x.com", "pw").await?;
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_account")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

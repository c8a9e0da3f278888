#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Barrier;
use warden_core::database::in_memory::InMemoryUserScope;
use warden_core::domain::users::user::NewUser;
use warden_core::error::Result;
use warden_core::{
    AccountService, CredentialHasher, InMemoryUserStorage, StorageError,
    TokenService, TokenSettings, UserRecord, UserScope, UserStorage, UserStore,
};

pub const TEST_SECRET: &str = "integration-secret";

pub fn token_service() -> Arc<TokenService> {
    Arc::new(
        TokenService::new(TokenSettings::new(TEST_SECRET, "HS256"))
            .expect("valid token settings"),
    )
}

pub fn user_store() -> UserStore {
    let hasher = CredentialHasher::insecure_for_tests().expect("minimum Argon2 params");
    UserStore::new(Arc::new(hasher))
}

pub fn in_memory_accounts() -> AccountService<InMemoryUserStorage> {
    AccountService::new(InMemoryUserStorage::new(), user_store(), token_service())
}

/// Where [`FaultyStorage`] injects its failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    Save,
    Remove,
    Commit,
}

pub const INJECTED: &str = "injected storage fault";

/// Wraps the in-memory storage and fails one kind of call on demand.
#[derive(Debug, Clone)]
pub struct FaultyStorage {
    inner: InMemoryUserStorage,
    fault: Fault,
    rollbacks: Arc<AtomicUsize>,
}

impl FaultyStorage {
    pub fn new(inner: InMemoryUserStorage, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            rollbacks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FaultyScope {
    inner: InMemoryUserScope,
    fault: Fault,
    rollbacks: Arc<AtomicUsize>,
}

impl FaultyScope {
    fn check(&self, at: Fault) -> Result<()> {
        if self.fault == at {
            return Err(StorageError::Internal(INJECTED.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStorage for FaultyStorage {
    type Scope = FaultyScope;

    async fn begin(&self) -> Result<FaultyScope> {
        Ok(FaultyScope {
            inner: self.inner.begin().await?,
            fault: self.fault,
            rollbacks: Arc::clone(&self.rollbacks),
        })
    }
}

#[async_trait]
impl UserScope for FaultyScope {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<UserRecord>> {
        self.inner.find_by_email(email).await
    }

    async fn find_other_by_email(
        &mut self,
        email: &str,
        exclude_id: i64,
    ) -> Result<Option<UserRecord>> {
        self.inner.find_other_by_email(email, exclude_id).await
    }

    async fn insert(&mut self, user: NewUser) -> Result<UserRecord> {
        self.inner.insert(user).await
    }

    async fn save(&mut self, user: &UserRecord) -> Result<()> {
        self.check(Fault::Save)?;
        self.inner.save(user).await
    }

    async fn remove(&mut self, id: i64) -> Result<()> {
        self.check(Fault::Remove)?;
        self.inner.remove(id).await
    }

    async fn commit(self) -> Result<()> {
        self.check(Fault::Commit)?;
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}

/// Holds each scope at `insert` until `parties` scopes have reached it, so
/// concurrent creates all pass their lookup before any of them writes.
#[derive(Debug, Clone)]
pub struct GatedStorage {
    inner: InMemoryUserStorage,
    gate: Arc<Barrier>,
}

impl GatedStorage {
    pub fn new(inner: InMemoryUserStorage, parties: usize) -> Self {
        Self {
            inner,
            gate: Arc::new(Barrier::new(parties)),
        }
    }
}

#[derive(Debug)]
pub struct GatedScope {
    inner: InMemoryUserScope,
    gate: Arc<Barrier>,
}

#[async_trait]
impl UserStorage for GatedStorage {
    type Scope = GatedScope;

    async fn begin(&self) -> Result<GatedScope> {
        Ok(GatedScope {
            inner: self.inner.begin().await?,
            gate: Arc::clone(&self.gate),
        })
    }
}

#[async_trait]
impl UserScope for GatedScope {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<UserRecord>> {
        self.inner.find_by_email(email).await
    }

    async fn find_other_by_email(
        &mut self,
        email: &str,
        exclude_id: i64,
    ) -> Result<Option<UserRecord>> {
        self.inner.find_other_by_email(email, exclude_id).await
    }

    async fn insert(&mut self, user: NewUser) -> Result<UserRecord> {
        self.gate.wait().await;
        self.inner.insert(user).await
    }

    async fn save(&mut self, user: &UserRecord) -> Result<()> {
        self.inner.save(user).await
    }

    async fn remove(&mut self, id: i64) -> Result<()> {
        self.inner.remove(id).await
    }

    async fn commit(self) -> Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<()> {
        self.inner.rollback().await
    }
}

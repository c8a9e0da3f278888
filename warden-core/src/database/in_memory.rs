use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::database::ports::users::{UserScope, UserStorage};
use crate::domain::users::user::{NewUser, UserRecord};
use crate::error::{Result, StorageError};

type Table = BTreeMap<i64, UserRecord>;

/// Process-local user storage.
///
/// Each scope works on a snapshot of the committed table and stages its
/// changes; commit replays them against the current table and enforces the
/// email uniqueness constraint there, so two scopes racing on one email
/// cannot both commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStorage {
    table: Arc<Mutex<Table>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed records ordered by id.
    pub async fn records(&self) -> Vec<UserRecord> {
        self.table.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    type Scope = InMemoryUserScope;

    async fn begin(&self) -> Result<InMemoryUserScope> {
        let working = self.table.lock().await.clone();
        Ok(InMemoryUserScope {
            table: Arc::clone(&self.table),
            next_id: Arc::clone(&self.next_id),
            working,
            changes: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum Change {
    Insert(UserRecord),
    Update(UserRecord),
    Remove(i64),
}

#[derive(Debug)]
pub struct InMemoryUserScope {
    table: Arc<Mutex<Table>>,
    next_id: Arc<AtomicI64>,
    working: Table,
    changes: Vec<Change>,
}

fn email_taken(table: &Table, email: &str, id: i64) -> bool {
    table
        .values()
        .any(|record| record.id != id && record.email == email)
}

#[async_trait]
impl UserScope for InMemoryUserScope {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .working
            .values()
            .find(|record| record.email == email)
            .cloned())
    }

    async fn find_other_by_email(
        &mut self,
        email: &str,
        exclude_id: i64,
    ) -> Result<Option<UserRecord>> {
        Ok(self
            .working
            .values()
            .find(|record| record.id != exclude_id && record.email == email)
            .cloned())
    }

    async fn insert(&mut self, user: NewUser) -> Result<UserRecord> {
        // Identities come from a sequence, so like a database sequence they
        // are not reused after a rollback.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if email_taken(&self.working, &user.email, id) {
            return Err(StorageError::UniqueEmail(user.email));
        }

        let record = UserRecord {
            id,
            email: user.email,
            hashed_password: user.hashed_password,
            refresh_token: None,
        };
        self.working.insert(id, record.clone());
        self.changes.push(Change::Insert(record.clone()));
        Ok(record)
    }

    async fn save(&mut self, user: &UserRecord) -> Result<()> {
        if !self.working.contains_key(&user.id) {
            return Err(StorageError::MissingRecord(user.id));
        }
        if email_taken(&self.working, &user.email, user.id) {
            return Err(StorageError::UniqueEmail(user.email.clone()));
        }

        self.working.insert(user.id, user.clone());
        self.changes.push(Change::Update(user.clone()));
        Ok(())
    }

    async fn remove(&mut self, id: i64) -> Result<()> {
        if self.working.remove(&id).is_none() {
            return Err(StorageError::MissingRecord(id));
        }
        self.changes.push(Change::Remove(id));
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();

        for change in self.changes {
            match change {
                Change::Insert(record) => {
                    if email_taken(&next, &record.email, record.id) {
                        return Err(StorageError::UniqueEmail(record.email));
                    }
                    next.insert(record.id, record);
                }
                Change::Update(record) => {
                    if !next.contains_key(&record.id) {
                        return Err(StorageError::MissingRecord(record.id));
                    }
                    if email_taken(&next, &record.email, record.id) {
                        return Err(StorageError::UniqueEmail(record.email));
                    }
                    next.insert(record.id, record);
                }
                Change::Remove(id) => {
                    next.remove(&id);
                }
            }
        }

        *table = next;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        debug!(discarded = self.changes.len(), "rolled back in-memory scope");
        Ok(())
    }
}

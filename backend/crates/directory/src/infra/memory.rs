//! In-Memory Repository Implementation
//!
//! Keeps records in process memory behind a `tokio::sync::RwLock`.
//! Records go in and come out by value; the stored copies are never
//! shared with callers.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::entity::UserRecord;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{DirectoryError, DirectoryResult};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<UserId, UserRecord>,
    by_name: HashMap<UserName, UserId>,
    /// Insertion order, for stable listing
    order: Vec<UserId>,
}

impl Records {
    fn insert(&mut self, record: UserRecord) -> DirectoryResult<()> {
        if self.by_id.contains_key(&record.id) {
            return Err(DirectoryError::IdCollision(record.id));
        }
        if self.by_name.contains_key(&record.username) {
            return Err(DirectoryError::UserNameTaken);
        }

        self.by_name.insert(record.username.clone(), record.id);
        self.order.push(record.id);
        self.by_id.insert(record.id, record);
        Ok(())
    }

    fn update(&mut self, record: UserRecord) -> DirectoryResult<()> {
        let previous = self
            .by_id
            .get(&record.id)
            .ok_or(DirectoryError::UserNotFound)?;

        if previous.username != record.username {
            if self.by_name.contains_key(&record.username) {
                return Err(DirectoryError::UserNameTaken);
            }
            self.by_name.remove(&previous.username);
            self.by_name.insert(record.username.clone(), record.id);
        }

        self.by_id.insert(record.id, record);
        Ok(())
    }

    fn remove(&mut self, user_id: &UserId) -> Option<UserRecord> {
        let record = self.by_id.remove(user_id)?;
        self.by_name.remove(&record.username);
        self.order.retain(|id| id != user_id);
        Some(record)
    }
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    records: RwLock<Records>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with already hashed records
    pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> DirectoryResult<Self> {
        let mut inner = Records::default();
        for record in records {
            inner.insert(record)?;
        }
        Ok(Self {
            records: RwLock::new(inner),
        })
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> DirectoryResult<Vec<UserRecord>> {
        let records = self.records.read().await;
        Ok(records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, user_id: &UserId) -> DirectoryResult<Option<UserRecord>> {
        Ok(self.records.read().await.by_id.get(user_id).cloned())
    }

    async fn find_by_user_name(
        &self,
        user_name: &UserName,
    ) -> DirectoryResult<Option<UserRecord>> {
        let records = self.records.read().await;
        Ok(records
            .by_name
            .get(user_name)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn insert(&self, record: UserRecord) -> DirectoryResult<()> {
        self.records.write().await.insert(record)
    }

    async fn update(&self, record: UserRecord) -> DirectoryResult<()> {
        self.records.write().await.update(record)
    }

    async fn remove(&self, user_id: &UserId) -> DirectoryResult<Option<UserRecord>> {
        Ok(self.records.write().await.remove(user_id))
    }
}

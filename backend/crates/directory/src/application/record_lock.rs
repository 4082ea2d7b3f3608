//! Per-record locks
//!
//! Every read-modify-write of a user record runs while holding that
//! record's lock, so two writers for the same id are serialized and
//! neither overwrites the other's change. Unrelated records never wait on
//! each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Default)]
pub struct RecordLocks {
    slots: Mutex<HashMap<UserId, Slot>>,
}

/// One record's lock and the number of guards holding or awaiting it
#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one record
    ///
    /// The guard is counted before waiting, so a caller that gives up
    /// while waiting still releases its slot.
    pub async fn lock(&self, user_id: UserId) -> RecordGuard<'_> {
        let lock = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(user_id).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        let mut pending = RecordGuard {
            locks: self,
            user_id,
            guard: None,
        };
        pending.guard = Some(lock.lock_owned().await);
        pending
    }

    /// Number of records currently locked or awaited
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, user_id: &UserId) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(user_id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(user_id);
            }
        }
    }
}

/// Held (or awaited) lock on one record; released on drop
#[derive(Debug)]
pub struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.user_id);
    }
}

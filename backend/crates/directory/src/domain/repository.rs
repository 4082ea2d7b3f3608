//! Repository Traits
//!
//! Interface for user storage. Implementations live in the infrastructure
//! layer; the store never depends on how records are kept.
//!
//! Records are passed and returned by value, so a caller can never hold a
//! reference into the stored collection.

use crate::domain::entity::UserRecord;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::DirectoryResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// All records, in insertion order
    async fn list(&self) -> DirectoryResult<Vec<UserRecord>>;

    /// Find record by ID
    async fn find_by_id(&self, user_id: &UserId) -> DirectoryResult<Option<UserRecord>>;

    /// Find record by user name (exact match)
    async fn find_by_user_name(&self, user_name: &UserName)
    -> DirectoryResult<Option<UserRecord>>;

    /// Insert a new record
    ///
    /// Fails with `UserNameTaken` or `IdCollision` without storing anything.
    async fn insert(&self, record: UserRecord) -> DirectoryResult<()>;

    /// Replace an existing record (matched by id)
    ///
    /// Fails with `UserNotFound` if the id is absent, or `UserNameTaken` if
    /// the new user name belongs to another record.
    async fn update(&self, record: UserRecord) -> DirectoryResult<()>;

    /// Remove a record, returning it
    async fn remove(&self, user_id: &UserId) -> DirectoryResult<Option<UserRecord>>;
}

//! User Store
//!
//! Owns access to the user collection through an injected repository and
//! implements every directory operation on top of it. Only sanitized
//! `User` values leave the store.
//!
//! ## Concurrency
//! - Each read-modify-write holds the record's lock and re-reads the record
//!   after acquiring it.
//! - `verify_password` sleeps off its backoff delay before taking the lock,
//!   so a pending delay never blocks other requests.
//! - Hashing happens off the async executor (see `CredentialEngine`).

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::record_lock::RecordLocks;
use crate::domain::entity::{NewUser, User, UserPatch, UserRecord};
use crate::domain::repository::UserRepository;
use crate::domain::services::CredentialEngine;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{DirectoryError, DirectoryResult};

/// User store over a repository `R`
pub struct UserStore<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    engine: CredentialEngine,
    locks: RecordLocks,
}

impl<R> UserStore<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, engine: CredentialEngine) -> Self {
        Self {
            repo,
            engine,
            locks: RecordLocks::new(),
        }
    }

    pub fn engine(&self) -> &CredentialEngine {
        &self.engine
    }

    /// All users, sanitized
    pub async fn all(&self) -> DirectoryResult<Vec<User>> {
        let records = self.repo.list().await?;
        Ok(records.iter().map(UserRecord::sanitized).collect())
    }

    pub async fn read(&self, user_id: &UserId) -> DirectoryResult<User> {
        self.repo
            .find_by_id(user_id)
            .await?
            .map(|record| record.sanitized())
            .ok_or(DirectoryError::UserNotFound)
    }

    /// Exact, case-sensitive lookup
    pub async fn by_user_name(&self, user_name: &str) -> DirectoryResult<User> {
        let user_name = UserName::new(user_name).map_err(|_| DirectoryError::UserNotFound)?;
        self.repo
            .find_by_user_name(&user_name)
            .await?
            .map(|record| record.sanitized())
            .ok_or(DirectoryError::UserNotFound)
    }

    /// Create a user with a fresh id and a hashed password
    ///
    /// Nothing is stored if hashing fails.
    pub async fn create(&self, new_user: NewUser) -> DirectoryResult<User> {
        let NewUser {
            username,
            password,
            profile,
        } = new_user;

        let username =
            UserName::new(username).map_err(|e| DirectoryError::InvalidInput(e.to_string()))?;
        self.engine.check_policy(&password)?;

        if self.repo.find_by_user_name(&username).await?.is_some() {
            return Err(DirectoryError::UserNameTaken);
        }

        let hashed = self.engine.hash(password).await?;
        let record = UserRecord::new(username, hashed, profile);
        let user = record.sanitized();

        self.repo.insert(record).await?;

        tracing::info!(user_id = %user.id, user_name = %user.username, "User created");

        Ok(user)
    }

    /// Shallow-merge a patch into the record
    ///
    /// `id`, `password` and `passwordAttempts` are never touched.
    pub async fn update(&self, user_id: &UserId, patch: UserPatch) -> DirectoryResult<User> {
        let username = Self::patch_user_name(&patch)?;

        let _guard = self.locks.lock(*user_id).await;
        let mut record = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        record.apply(username, patch.profile);
        let user = record.sanitized();
        self.repo.update(record).await?;

        tracing::info!(user_id = %user_id, "User updated");

        Ok(user)
    }

    /// Apply a patch and set a new password as one change
    ///
    /// The password is checked and hashed before the record is touched;
    /// either both changes are stored or neither is.
    pub async fn update_with_password(
        &self,
        user_id: &UserId,
        patch: UserPatch,
        password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        let username = Self::patch_user_name(&patch)?;
        self.engine.check_policy(&password)?;

        if self.repo.find_by_id(user_id).await?.is_none() {
            return Err(DirectoryError::UserNotFound);
        }

        let hashed = self.engine.hash(password).await?;

        let _guard = self.locks.lock(*user_id).await;
        let mut record = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        record.apply(username, patch.profile);
        record.set_password(hashed);
        let user = record.sanitized();
        self.repo.update(record).await?;

        tracing::info!(user_id = %user_id, "User updated with new password");

        Ok(user)
    }

    /// Set a new password without checking the old one
    pub async fn reset_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        let user_name = UserName::new(user_name).map_err(|_| DirectoryError::UserNotFound)?;
        let user_id = self
            .repo
            .find_by_user_name(&user_name)
            .await?
            .ok_or(DirectoryError::UserNotFound)?
            .id;

        self.engine.check_policy(&password)?;
        let hashed = self.engine.hash(password).await?;

        let _guard = self.locks.lock(user_id).await;
        let mut record = self
            .repo
            .find_by_id(&user_id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        record.set_password(hashed);
        let user = record.sanitized();
        self.repo.update(record).await?;

        tracing::info!(user_id = %user_id, "Password reset");

        Ok(user)
    }

    /// Replace the password after checking the old one
    ///
    /// Unknown user, wrong old password and a failed verification all
    /// return the same `Unauthorized` error; an unknown user still costs a
    /// decoy verification.
    pub async fn update_password(
        &self,
        user_name: &str,
        old_password: ClearTextPassword,
        new_password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        let user_id = match self.find_for_credentials(user_name).await? {
            Some(record) => record.id,
            None => {
                self.engine.verify_decoy(old_password).await;
                return Err(DirectoryError::Unauthorized);
            }
        };

        let _guard = self.locks.lock(user_id).await;
        let mut record = self
            .repo
            .find_by_id(&user_id)
            .await?
            .ok_or(DirectoryError::Unauthorized)?;

        match self.engine.verify(old_password, record.password.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(user_id = %user_id, "Password change rejected");
                return Err(DirectoryError::Unauthorized);
            }
            Err(e) => {
                e.log();
                return Err(DirectoryError::Unauthorized);
            }
        }

        self.engine.check_policy(&new_password)?;
        let hashed = self.engine.hash(new_password).await?;

        record.set_password(hashed);
        let user = record.sanitized();
        self.repo.update(record).await?;

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(user)
    }

    /// Check a password, imposing the backoff delay first
    ///
    /// The delay is computed from the failures recorded before this call.
    /// A mismatch increments the counter and fails with `Unauthorized`; a
    /// match resets it. A corrupt stored hash fails with `Hash` and leaves
    /// the counter alone. An unknown user is checked against a decoy hash
    /// before failing with `Unauthorized`.
    pub async fn verify_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<bool> {
        let snapshot = match self.find_for_credentials(user_name).await? {
            Some(record) => record,
            None => {
                self.engine.verify_decoy(password).await;
                return Err(DirectoryError::Unauthorized);
            }
        };

        let delay = self.engine.delay(snapshot.password_attempts);
        if !delay.is_zero() {
            tracing::debug!(
                user_id = %snapshot.id,
                attempts = snapshot.password_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Delaying credential check"
            );
            tokio::time::sleep(delay).await;
        }

        let _guard = self.locks.lock(snapshot.id).await;
        let mut record = self
            .repo
            .find_by_id(&snapshot.id)
            .await?
            .ok_or(DirectoryError::Unauthorized)?;

        let matched = self.engine.verify(password, record.password.clone()).await?;

        if matched {
            if record.password_attempts != 0 {
                record.reset_attempts();
                self.repo.update(record).await?;
            }
            tracing::debug!(user_id = %snapshot.id, "Credential check passed");
            Ok(true)
        } else {
            record.record_failure();
            let attempts = record.password_attempts;
            self.repo.update(record).await?;
            tracing::warn!(user_id = %snapshot.id, attempts, "Credential check failed");
            Err(DirectoryError::Unauthorized)
        }
    }

    /// Remove a user, returning the removed record
    pub async fn delete(&self, user_id: &UserId) -> DirectoryResult<User> {
        let _guard = self.locks.lock(*user_id).await;
        let record = self
            .repo
            .remove(user_id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        tracing::info!(user_id = %user_id, user_name = %record.username, "User deleted");

        Ok(record.sanitized())
    }

    async fn find_for_credentials(&self, user_name: &str) -> DirectoryResult<Option<UserRecord>> {
        match UserName::new(user_name) {
            Ok(user_name) => self.repo.find_by_user_name(&user_name).await,
            Err(_) => Ok(None),
        }
    }

    fn patch_user_name(patch: &UserPatch) -> DirectoryResult<Option<UserName>> {
        patch
            .username
            .as_deref()
            .map(UserName::new)
            .transpose()
            .map_err(|e| DirectoryError::InvalidInput(e.to_string()))
    }
}

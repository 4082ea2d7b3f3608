//! Credential Engine
//!
//! Wraps password hashing, the password policy and the failure backoff.
//! Hashing is CPU-bound and runs on the blocking thread pool.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use platform::backoff::BackoffPolicy;
use platform::password::{
    Argon2Hasher, ClearTextPassword, CredentialHasher, HashedPassword, PasswordHashError,
    PasswordPolicy,
};

use crate::error::{DirectoryError, DirectoryResult};

/// Clear text behind the decoy hash checked for unknown users
const DECOY_PASSWORD: &str = "directory-decoy-credential";

#[derive(Debug, Clone)]
pub struct CredentialEngine {
    hasher: Arc<dyn CredentialHasher>,
    policy: PasswordPolicy,
    backoff: BackoffPolicy,
    decoy: Arc<OnceLock<HashedPassword>>,
}

impl CredentialEngine {
    pub fn new(hasher: Argon2Hasher, policy: PasswordPolicy, backoff: BackoffPolicy) -> Self {
        Self::with_hasher(Arc::new(hasher), policy, backoff)
    }

    pub fn with_hasher(
        hasher: Arc<dyn CredentialHasher>,
        policy: PasswordPolicy,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            hasher,
            policy,
            backoff,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Reject passwords outside the configured policy
    pub fn check_policy(&self, password: &ClearTextPassword) -> DirectoryResult<()> {
        self.policy
            .check(password)
            .map_err(|e| DirectoryError::InvalidInput(e.to_string()))
    }

    /// Hash with a fresh salt
    pub async fn hash(&self, password: ClearTextPassword) -> DirectoryResult<HashedPassword> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))??;
        Ok(hashed)
    }

    /// `Ok(false)` on mismatch; `Err` only when verification could not run
    pub async fn verify(
        &self,
        password: ClearTextPassword,
        stored: HashedPassword,
    ) -> DirectoryResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| PasswordHashError::VerificationFailed(e.to_string()))??;
        Ok(matched)
    }

    /// Spend one verification on a password that has no user behind it
    ///
    /// Keeps an unknown user name as slow to reject as a wrong password.
    /// The decoy hash is made on first use and reused afterwards.
    pub async fn verify_decoy(&self, password: ClearTextPassword) {
        let hasher = Arc::clone(&self.hasher);
        let decoy = Arc::clone(&self.decoy);

        let checked = tokio::task::spawn_blocking(move || {
            let stored = match decoy.get() {
                Some(stored) => stored.clone(),
                None => {
                    let stored = hasher.hash(&ClearTextPassword::from(DECOY_PASSWORD))?;
                    decoy.get_or_init(|| stored).clone()
                }
            };
            hasher.verify(&password, &stored)
        })
        .await;

        match checked {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Decoy verification failed"),
            Err(e) => tracing::debug!(error = %e, "Decoy verification task failed"),
        }
    }

    /// Delay owed before the next check, given prior consecutive failures
    pub fn delay(&self, attempts: u32) -> Duration {
        self.backoff.delay(attempts)
    }
}

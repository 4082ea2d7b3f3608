//! User Entity
//!
//! `UserRecord` is the stored form and carries the password hash.
//! `User` is the sanitized copy handed to callers; it has no password
//! field at all, so a record can only leave the store without its secret.

use platform::password::{ClearTextPassword, HashedPassword};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_object::{
    profile::{
        ID_FIELD, PASSWORD_ATTEMPTS_FIELD, PASSWORD_FIELD, Profile, USERNAME_FIELD,
    },
    user_id::UserId,
    user_name::UserName,
};
use crate::error::DirectoryError;

// ============================================================================
// UserRecord
// ============================================================================

/// Stored user record
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Assigned on creation, never changes
    pub id: UserId,
    /// Unique, case-sensitive
    pub username: UserName,
    /// Argon2id PHC string
    pub password: HashedPassword,
    /// Consecutive failed verifications
    pub password_attempts: u32,
    pub profile: Profile,
}

impl UserRecord {
    /// Create a record with a fresh id and a clean attempt counter
    pub fn new(username: UserName, password: HashedPassword, profile: Profile) -> Self {
        Self {
            id: UserId::new(),
            username,
            password,
            password_attempts: 0,
            profile,
        }
    }

    /// Copy without the password
    pub fn sanitized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            password_attempts: self.password_attempts,
            profile: self.profile.clone(),
        }
    }

    pub fn record_failure(&mut self) {
        self.password_attempts = self.password_attempts.saturating_add(1);
    }

    pub fn reset_attempts(&mut self) {
        self.password_attempts = 0;
    }

    /// Replace the password hash; clears the failure counter
    pub fn set_password(&mut self, password: HashedPassword) {
        self.password = password;
        self.password_attempts = 0;
    }

    /// Apply an already validated patch
    pub fn apply(&mut self, username: Option<UserName>, profile: Profile) {
        if let Some(username) = username {
            self.username = username;
        }
        self.profile.merge(profile);
    }
}

// ============================================================================
// User (sanitized)
// ============================================================================

/// Sanitized user, serialized as one flat object
///
/// `{"id": "...", "username": "...", "passwordAttempts": 0, ...profile}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: UserName,
    pub password_attempts: u32,
    #[serde(flatten)]
    pub profile: Profile,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        record.sanitized()
    }
}

// ============================================================================
// NewUser
// ============================================================================

/// Creation payload: `{"username", "password", ...profile}`
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(deserialize_with = "clear_text")]
    pub password: ClearTextPassword,
    #[serde(flatten)]
    pub profile: Profile,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<ClearTextPassword>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            profile: Profile::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.profile.insert(key, value);
        self
    }
}

pub(crate) fn clear_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ClearTextPassword, D::Error> {
    String::deserialize(deserializer).map(ClearTextPassword::new)
}

// ============================================================================
// UserPatch
// ============================================================================

/// Partial update
///
/// `id`, `password` and `passwordAttempts` are dropped on construction;
/// they cannot be changed through a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub profile: Profile,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from free-form JSON fields
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self, DirectoryError> {
        fields.remove(ID_FIELD);
        fields.remove(PASSWORD_FIELD);
        fields.remove(PASSWORD_ATTEMPTS_FIELD);

        let username = match fields.remove(USERNAME_FIELD) {
            None => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => {
                return Err(DirectoryError::InvalidInput(
                    "username must be a string".to_string(),
                ));
            }
        };

        Ok(Self {
            username,
            profile: Profile::from_fields(fields),
        })
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.profile.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.profile.is_empty()
    }
}

impl<'de> Deserialize<'de> for UserPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> UserRecord {
        let mut profile = Profile::new();
        profile.insert("name", json!("Trever Smith"));
        UserRecord::new(
            UserName::new("trever").unwrap(),
            HashedPassword::from_phc_string_unchecked("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA"),
            profile,
        )
    }

    #[test]
    fn test_sanitized_has_no_password() {
        let record = record();
        let json = serde_json::to_value(record.sanitized()).unwrap();

        assert_eq!(
            json,
            json!({
                "id": record.id.to_string(),
                "username": "trever",
                "passwordAttempts": 0,
                "name": "Trever Smith",
            })
        );
    }

    #[test]
    fn test_attempt_counter() {
        let mut record = record();
        record.record_failure();
        record.record_failure();
        assert_eq!(record.password_attempts, 2);

        record.set_password(HashedPassword::from_phc_string_unchecked("other"));
        assert_eq!(record.password_attempts, 0);

        record.password_attempts = u32::MAX;
        record.record_failure();
        assert_eq!(record.password_attempts, u32::MAX);
    }

    #[test]
    fn test_patch_strips_protected_fields() {
        let patch: UserPatch = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "password": "hunter2",
            "passwordAttempts": 0,
            "username": "trever2",
            "phone": "555",
        }))
        .unwrap();

        assert_eq!(patch.username.as_deref(), Some("trever2"));
        assert_eq!(patch.profile.len(), 1);
        assert_eq!(patch.profile.get("phone"), Some(&json!("555")));
    }

    #[test]
    fn test_patch_rejects_non_string_username() {
        let fields = match json!({ "username": 42 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(matches!(
            UserPatch::from_fields(fields),
            Err(DirectoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_apply_merges_profile() {
        let mut record = record();
        record.apply(
            Some(UserName::new("trever.s").unwrap()),
            UserPatch::new().with_field("phone", json!("555")).profile,
        );

        assert_eq!(record.username.as_str(), "trever.s");
        assert_eq!(record.profile.get("name"), Some(&json!("Trever Smith")));
        assert_eq!(record.profile.get("phone"), Some(&json!("555")));
    }

    #[test]
    fn test_new_user_from_json() {
        let new_user: NewUser = serde_json::from_value(json!({
            "username": "trever",
            "password": "123",
            "passwordAttempts": 7,
            "name": "Trever Smith",
        }))
        .unwrap();

        assert_eq!(new_user.username, "trever");
        assert_eq!(new_user.profile.len(), 1);
        assert!(format!("{:?}", new_user).contains("REDACTED"));
    }
}

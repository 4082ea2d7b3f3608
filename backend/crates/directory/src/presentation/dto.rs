//! Bus DTOs (Data Transfer Objects)
//!
//! Request payloads as they arrive on the request topics.

use platform::password::ClearTextPassword;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::domain::entity::{UserPatch, user::clear_text};
use crate::domain::value_object::profile::{ID_FIELD, PASSWORD_FIELD};

// ============================================================================
// Lookups
// ============================================================================

/// `"<id>"` or `{"id": "<id>"}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdRequest {
    Bare(String),
    Object { id: String },
}

impl IdRequest {
    pub fn id(&self) -> &str {
        match self {
            IdRequest::Bare(id) | IdRequest::Object { id } => id,
        }
    }
}

/// `"<username>"` or `{"username": "<username>"}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserNameRequest {
    Bare(String),
    Object { username: String },
}

impl UserNameRequest {
    pub fn username(&self) -> &str {
        match self {
            UserNameRequest::Bare(username) | UserNameRequest::Object { username } => username,
        }
    }
}

// ============================================================================
// Update
// ============================================================================

/// `{"id", ...patch, "password"?}`
///
/// A `password` turns the update into an update-with-password.
#[derive(Debug)]
pub struct UpdateRequest {
    pub id: String,
    pub password: Option<ClearTextPassword>,
    pub patch: UserPatch,
}

impl<'de> Deserialize<'de> for UpdateRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let id = match fields.remove(ID_FIELD) {
            Some(Value::String(id)) => id,
            Some(_) => return Err(D::Error::custom("id must be a string")),
            None => return Err(D::Error::missing_field("id")),
        };

        let password = match fields.remove(PASSWORD_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(password)) => Some(ClearTextPassword::new(password)),
            Some(_) => return Err(D::Error::custom("password must be a string")),
        };

        let patch = UserPatch::from_fields(fields).map_err(D::Error::custom)?;

        Ok(Self {
            id,
            password,
            patch,
        })
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// `wfm:user:auth` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub user_identifier: String,
    #[serde(deserialize_with = "clear_text")]
    pub password: ClearTextPassword,
}

/// `wfm:user:password` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub user_identifier: String,
    #[serde(deserialize_with = "clear_text")]
    pub old_pwd: ClearTextPassword,
    #[serde(deserialize_with = "clear_text")]
    pub new_pwd: ClearTextPassword,
}

/// `wfm:user:password:reset` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub user_identifier: String,
    #[serde(deserialize_with = "clear_text")]
    pub new_pwd: ClearTextPassword,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_request_forms() {
        let bare: IdRequest = serde_json::from_value(json!("abc")).unwrap();
        let object: IdRequest = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(bare.id(), "abc");
        assert_eq!(object.id(), "abc");
        assert!(serde_json::from_value::<IdRequest>(json!(42)).is_err());
    }

    #[test]
    fn test_user_name_request_forms() {
        let object: UserNameRequest = serde_json::from_value(json!({"username": "trever"})).unwrap();
        assert_eq!(object.username(), "trever");
    }

    #[test]
    fn test_update_request() {
        let req: UpdateRequest = serde_json::from_value(json!({
            "id": "abc",
            "password": "new-secret",
            "passwordAttempts": 0,
            "phone": "555",
        }))
        .unwrap();

        assert_eq!(req.id, "abc");
        assert!(req.password.is_some());
        assert_eq!(req.patch.profile.len(), 1);
        assert!(req.patch.username.is_none());
    }

    #[test]
    fn test_update_request_requires_id() {
        assert!(serde_json::from_value::<UpdateRequest>(json!({"phone": "555"})).is_err());
        assert!(serde_json::from_value::<UpdateRequest>(json!({"id": 7})).is_err());
    }

    #[test]
    fn test_credential_requests() {
        let auth: AuthRequest =
            serde_json::from_value(json!({"userIdentifier": "alice", "password": "secret1"}))
                .unwrap();
        assert_eq!(auth.user_identifier, "alice");
        assert!(format!("{auth:?}").contains("REDACTED"));

        let change: PasswordChangeRequest = serde_json::from_value(json!({
            "userIdentifier": "alice",
            "oldPwd": "secret1",
            "newPwd": "secret2",
        }))
        .unwrap();
        assert_eq!(change.user_identifier, "alice");

        assert!(
            serde_json::from_value::<PasswordResetRequest>(json!({"userIdentifier": "alice"}))
                .is_err()
        );
    }
}

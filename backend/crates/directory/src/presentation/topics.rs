//! Topic Names
//!
//! Request topics the dispatcher listens on, and the outcome topics it
//! answers on: `done:<topic>[:<key>]` for a result and
//! `error:<topic>[:<key>]` for a failure.

use serde_json::Value;

pub const LIST: &str = "wfm:user:list";
pub const READ: &str = "wfm:user:read";
pub const USERNAME_READ: &str = "wfm:user:username:read";
pub const CREATE: &str = "wfm:user:create";
pub const UPDATE: &str = "wfm:user:update";
pub const AUTH: &str = "wfm:user:auth";
pub const PASSWORD_CHANGE: &str = "wfm:user:password";
pub const PASSWORD_RESET: &str = "wfm:user:password:reset";
pub const DELETE: &str = "wfm:user:delete";

/// Operation selected by a request topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    ReadByUserName,
    Create,
    Update,
    Auth,
    PasswordChange,
    PasswordReset,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::List,
        Operation::Read,
        Operation::ReadByUserName,
        Operation::Create,
        Operation::Update,
        Operation::Auth,
        Operation::PasswordChange,
        Operation::PasswordReset,
        Operation::Delete,
    ];

    pub fn topic(self) -> &'static str {
        match self {
            Operation::List => LIST,
            Operation::Read => READ,
            Operation::ReadByUserName => USERNAME_READ,
            Operation::Create => CREATE,
            Operation::Update => UPDATE,
            Operation::Auth => AUTH,
            Operation::PasswordChange => PASSWORD_CHANGE,
            Operation::PasswordReset => PASSWORD_RESET,
            Operation::Delete => DELETE,
        }
    }

    pub fn from_topic(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.topic() == topic)
    }

    /// Whether the payload may be the key itself rather than an object
    pub fn accepts_bare_key(self) -> bool {
        matches!(
            self,
            Operation::Read | Operation::ReadByUserName | Operation::Delete
        )
    }

    /// Key appended to the outcome topics, read from the raw payload
    ///
    /// Works on undecoded JSON so a malformed request can still be
    /// answered on the topic its sender is waiting on.
    pub fn reply_key(self, payload: &Value) -> Option<String> {
        let field = match self {
            Operation::List => return None,
            Operation::Read | Operation::Update | Operation::Delete => "id",
            Operation::ReadByUserName | Operation::Create => "username",
            Operation::Auth | Operation::PasswordChange | Operation::PasswordReset => {
                "userIdentifier"
            }
        };

        match payload {
            Value::String(key) if self.accepts_bare_key() => Some(key.clone()),
            Value::Object(fields) => fields.get(field).and_then(key_string),
            _ => None,
        }
    }
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn done_topic(topic: &str, key: Option<&str>) -> String {
    outcome_topic("done", topic, key)
}

pub fn error_topic(topic: &str, key: Option<&str>) -> String {
    outcome_topic("error", topic, key)
}

fn outcome_topic(prefix: &str, topic: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{prefix}:{topic}:{key}"),
        None => format!("{prefix}:{topic}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_topics() {
        assert_eq!(done_topic(LIST, None), "done:wfm:user:list");
        assert_eq!(
            error_topic(AUTH, Some("alice")),
            "error:wfm:user:auth:alice"
        );
    }

    #[test]
    fn test_from_topic() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_topic(op.topic()), Some(op));
        }
        assert_eq!(Operation::from_topic("wfm:user:unknown"), None);
    }

    #[test]
    fn test_reply_keys() {
        assert_eq!(Operation::List.reply_key(&json!({"id": "x"})), None);
        assert_eq!(Operation::Read.reply_key(&json!("abc")), Some("abc".into()));
        assert_eq!(Operation::Read.reply_key(&json!({"id": "abc"})), Some("abc".into()));
        assert_eq!(
            Operation::ReadByUserName.reply_key(&json!("trever")),
            Some("trever".into())
        );
        assert_eq!(
            Operation::Create.reply_key(&json!({"username": "trever", "password": "x"})),
            Some("trever".into())
        );
        assert_eq!(
            Operation::Auth.reply_key(&json!({"userIdentifier": "alice"})),
            Some("alice".into())
        );
        assert_eq!(Operation::Update.reply_key(&json!("abc")), None);
        assert_eq!(Operation::Auth.reply_key(&json!({})), None);
    }
}

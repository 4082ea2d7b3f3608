//! Profile Value Object
//!
//! Free-form profile fields carried by a user record. The directory does
//! not interpret them; it only keeps the reserved record keys out.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";
pub const PASSWORD_ATTEMPTS_FIELD: &str = "passwordAttempts";

/// Keys owned by the record itself; never stored as profile fields
pub const RESERVED_FIELDS: [&str; 4] = [
    ID_FIELD,
    USERNAME_FIELD,
    PASSWORD_FIELD,
    PASSWORD_ATTEMPTS_FIELD,
];

/// Opaque profile fields (reserved keys stripped)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary JSON fields, silently dropping reserved keys
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        for key in RESERVED_FIELDS {
            fields.remove(key);
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a field; reserved keys are ignored
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if !RESERVED_FIELDS.contains(&key.as_str()) {
            self.0.insert(key, value);
        }
    }

    /// Shallow merge: every key of `other` overwrites the same key here
    pub fn merge(&mut self, other: Profile) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_fields)
    }
}

impl From<Map<String, Value>> for Profile {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}

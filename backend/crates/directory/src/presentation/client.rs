//! Directory Client
//!
//! Typed front end to the bus: one async method per directory operation,
//! each resolving with the decoded outcome.

use std::sync::Arc;
use std::time::Duration;

use kernel::error::app_error::{AppError, AppResult, ResultExt};
use kernel::error::kind::ErrorKind;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::domain::entity::{User, UserPatch};
use crate::domain::value_object::profile::{ID_FIELD, PASSWORD_FIELD, Profile, USERNAME_FIELD};
use crate::domain::value_object::user_id::UserId;
use crate::presentation::mediator::Mediator;
use crate::presentation::topics::{self, Operation};

#[derive(Clone)]
pub struct DirectoryClient {
    mediator: Arc<Mediator>,
    timeout: Option<Duration>,
}

impl DirectoryClient {
    pub fn new(mediator: Arc<Mediator>) -> Self {
        Self {
            mediator,
            timeout: None,
        }
    }

    /// Fail requests with `REQUEST_TIMEOUT` after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.send(topics::LIST, Value::Null).await
    }

    pub async fn read(&self, user_id: &UserId) -> AppResult<User> {
        self.send(topics::READ, json!(user_id.to_string())).await
    }

    pub async fn by_user_name(&self, user_name: &str) -> AppResult<User> {
        self.send(topics::USERNAME_READ, json!(user_name)).await
    }

    pub async fn create(
        &self,
        user_name: &str,
        password: &str,
        profile: Profile,
    ) -> AppResult<User> {
        let mut payload = profile.into_fields();
        payload.insert(USERNAME_FIELD.into(), json!(user_name));
        payload.insert(PASSWORD_FIELD.into(), json!(password));

        self.send(topics::CREATE, Value::Object(payload)).await
    }

    /// Update profile fields, optionally setting a new password in the same change
    pub async fn update(
        &self,
        user_id: &UserId,
        patch: UserPatch,
        password: Option<&str>,
    ) -> AppResult<User> {
        let mut payload: Map<String, Value> = patch.profile.into_fields();
        if let Some(user_name) = patch.username {
            payload.insert(USERNAME_FIELD.into(), json!(user_name));
        }
        if let Some(password) = password {
            payload.insert(PASSWORD_FIELD.into(), json!(password));
        }
        payload.insert(ID_FIELD.into(), json!(user_id.to_string()));

        self.send(topics::UPDATE, Value::Object(payload)).await
    }

    /// `Ok(true)` on a match; a mismatch is an `UNAUTHORIZED` error
    pub async fn authenticate(&self, user_identifier: &str, password: &str) -> AppResult<bool> {
        let payload = json!({ "userIdentifier": user_identifier, "password": password });
        self.send(topics::AUTH, payload).await
    }

    pub async fn change_password(
        &self,
        user_identifier: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<User> {
        let payload = json!({
            "userIdentifier": user_identifier,
            "oldPwd": old_password,
            "newPwd": new_password,
        });
        self.send(topics::PASSWORD_CHANGE, payload).await
    }

    pub async fn reset_password(
        &self,
        user_identifier: &str,
        new_password: &str,
    ) -> AppResult<User> {
        let payload = json!({ "userIdentifier": user_identifier, "newPwd": new_password });
        self.send(topics::PASSWORD_RESET, payload).await
    }

    pub async fn delete(&self, user_id: &UserId) -> AppResult<User> {
        self.send(topics::DELETE, json!(user_id.to_string())).await
    }

    /// Raw request on any directory topic
    pub async fn call(&self, topic: &str, payload: Value) -> AppResult<Value> {
        if Operation::from_topic(topic).is_none() {
            return Err(AppError::bad_request(format!("Unknown topic: {topic}")));
        }

        self.mediator.request(topic, payload, self.timeout).await
    }

    async fn send<T: DeserializeOwned>(&self, topic: &str, payload: Value) -> AppResult<T> {
        let value = self.mediator.request(topic, payload, self.timeout).await?;

        serde_json::from_value(value).map_app_err(
            ErrorKind::InternalServerError,
            format!("Malformed reply on {topic}"),
        )
    }
}

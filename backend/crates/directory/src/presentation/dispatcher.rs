//! Dispatcher
//!
//! Serves every request topic, runs exactly one directory operation per
//! request and settles it with exactly one outcome. The outcome goes back
//! on the request's own reply channel and is mirrored for observers on
//! `done:<topic>[:<key>]` (result) or `error:<topic>[:<key>]` (failure).
//! Each request is handled on its own task, so a delayed credential check
//! never holds up other requests.

use std::sync::Arc;

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::application::directory::UserDirectory;
use crate::domain::entity::NewUser;
use crate::domain::value_object::user_id::UserId;
use crate::error::{DirectoryError, DirectoryResult};
use crate::presentation::dto::{
    AuthRequest, IdRequest, PasswordChangeRequest, PasswordResetRequest, UpdateRequest,
    UserNameRequest,
};
use crate::presentation::mediator::{Mediator, Request};
use crate::presentation::topics::{Operation, done_topic, error_topic};

/// Running dispatcher; listeners stop when it is shut down or dropped
pub struct Dispatcher {
    listeners: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Take over every request topic and start serving
    ///
    /// The request queues are in place when this returns.
    pub fn start<D>(mediator: Arc<Mediator>, directory: Arc<D>) -> Self
    where
        D: UserDirectory + Send + Sync + 'static,
    {
        let listeners = Operation::ALL
            .into_iter()
            .map(|operation| {
                let mut requests = mediator.serve(operation.topic());
                let mediator = Arc::clone(&mediator);
                let directory = Arc::clone(&directory);

                tokio::spawn(async move {
                    while let Some(request) = requests.recv().await {
                        let mediator = Arc::clone(&mediator);
                        let directory = Arc::clone(&directory);
                        tokio::spawn(async move {
                            handle(&mediator, directory.as_ref(), operation, request).await;
                        });
                    }
                    tracing::debug!(topic = operation.topic(), "Listener stopped");
                })
            })
            .collect();

        tracing::info!(topics = Operation::ALL.len(), "Dispatcher started");

        Self { listeners }
    }

    /// Stop listening; requests already running finish on their own
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one request and settle it
pub async fn handle<D>(mediator: &Mediator, directory: &D, operation: Operation, request: Request)
where
    D: UserDirectory,
{
    let (payload, reply) = request.into_parts();
    let topic = operation.topic();
    let key = operation.reply_key(&payload);

    let outcome = execute(directory, operation, payload).await;

    let outcome_topic = match &outcome {
        Ok(_) => done_topic(topic, key.as_deref()),
        Err(e) => {
            tracing::debug!(topic, key = ?key, kind = %e.kind(), "Request failed");
            error_topic(topic, key.as_deref())
        }
    };

    if mediator.has_subscribers(&outcome_topic) {
        let mirrored = match &outcome {
            Ok(value) => value.clone(),
            Err(e) => e.to_json(),
        };
        if let Err(e) = mediator.publish(&outcome_topic, mirrored) {
            tracing::debug!(topic = %outcome_topic, error = %e, "Outcome had no listener");
        }
    }

    reply.send(outcome);
}

async fn execute<D>(directory: &D, operation: Operation, payload: Value) -> AppResult<Value>
where
    D: UserDirectory,
{
    match operation {
        Operation::List => reply(directory.all().await),
        Operation::Read => {
            let req: IdRequest = decode(payload)?;
            reply(directory.read(&parse_id(req.id())?).await)
        }
        Operation::ReadByUserName => {
            let req: UserNameRequest = decode(payload)?;
            reply(directory.by_user_name(req.username()).await)
        }
        Operation::Create => {
            let new_user: NewUser = decode(payload)?;
            reply(directory.create(new_user).await)
        }
        Operation::Update => {
            let req: UpdateRequest = decode(payload)?;
            let user_id = parse_id(&req.id)?;
            match req.password {
                Some(password) => reply(
                    directory
                        .update_with_password(&user_id, req.patch, password)
                        .await,
                ),
                None => reply(directory.update(&user_id, req.patch).await),
            }
        }
        Operation::Auth => {
            let req: AuthRequest = decode(payload)?;
            reply(
                directory
                    .verify_password(&req.user_identifier, req.password)
                    .await,
            )
        }
        Operation::PasswordChange => {
            let req: PasswordChangeRequest = decode(payload)?;
            reply(
                directory
                    .update_password(&req.user_identifier, req.old_pwd, req.new_pwd)
                    .await,
            )
        }
        Operation::PasswordReset => {
            let req: PasswordResetRequest = decode(payload)?;
            reply(
                directory
                    .reset_password(&req.user_identifier, req.new_pwd)
                    .await,
            )
        }
        Operation::Delete => {
            let req: IdRequest = decode(payload)?;
            reply(directory.delete(&parse_id(req.id())?).await)
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| AppError::bad_request(e.to_string()))
}

/// An id that cannot be parsed cannot exist
fn parse_id(raw: &str) -> AppResult<UserId> {
    UserId::parse_str(raw).map_err(|_| DirectoryError::UserNotFound.to_app_error())
}

fn reply<T: Serialize>(result: DirectoryResult<T>) -> AppResult<Value> {
    let value = result.map_err(|e| {
        e.log();
        e.to_app_error()
    })?;
    Ok(serde_json::to_value(value)?)
}

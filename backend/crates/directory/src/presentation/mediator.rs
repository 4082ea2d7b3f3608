//! Mediator
//!
//! In-process bus with two kinds of topic:
//! - request topics, each served through one `tokio::sync::mpsc` queue;
//!   a sender waits for room instead of losing the request, and every
//!   request carries its own reply channel
//! - broadcast topics on `tokio::sync::broadcast`, created on first
//!   subscription; every subscriber sees every message published after it
//!   subscribed
//!
//! The dispatcher mirrors each outcome onto the `done:` / `error:`
//! broadcast topics for observers, but [`Mediator::request`] waits on the
//! request's own reply channel, so concurrent requests with the same key
//! never see each other's outcome.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use kernel::error::app_error::{AppError, AppResult};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

/// A request waiting to be served
#[derive(Debug)]
pub struct Request {
    payload: Value,
    reply: Reply,
}

impl Request {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_parts(self) -> (Value, Reply) {
        (self.payload, self.reply)
    }
}

/// Where a request's outcome goes; empty for fire-and-forget requests
#[derive(Debug)]
pub struct Reply(Option<oneshot::Sender<AppResult<Value>>>);

impl Reply {
    /// Hand the outcome to the requester, if it is still waiting
    pub fn send(self, outcome: AppResult<Value>) {
        if let Some(tx) = self.0 {
            if tx.send(outcome).is_err() {
                tracing::debug!("Requester left before its outcome");
            }
        }
    }
}

pub struct Mediator {
    capacity: usize,
    topics: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    queues: Mutex<HashMap<String, mpsc::Sender<Request>>>,
}

impl Mediator {
    /// `capacity` is the number of messages buffered per topic
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Take over serving a request topic
    ///
    /// Replaces any earlier server of the same topic; requests already
    /// queued for it stay with the old receiver.
    pub fn serve(&self, topic: &str) -> mpsc::Receiver<Request> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string(), tx);
        rx
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Value> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Whether anyone is subscribed to a broadcast topic
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// Deliver `value` to every current subscriber of a broadcast topic
    ///
    /// Returns the number of subscribers reached. Fails with
    /// `SERVICE_UNAVAILABLE` when nobody is listening, and forgets the
    /// topic.
    pub fn publish(&self, topic: &str, value: Value) -> AppResult<usize> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let reached = topics
            .get(topic)
            .and_then(|sender| sender.send(value).ok());

        match reached {
            Some(count) => Ok(count),
            None => {
                topics.remove(topic);
                Err(AppError::service_unavailable(format!(
                    "No subscriber for {topic}"
                )))
            }
        }
    }

    /// Queue a request without waiting for its outcome
    ///
    /// The outcome is only visible on the `done:` / `error:` topics.
    pub async fn post(&self, topic: &str, payload: Value) -> AppResult<()> {
        self.enqueue(
            topic,
            Request {
                payload,
                reply: Reply(None),
            },
        )
        .await
    }

    /// Queue a request and wait for its own outcome
    ///
    /// With a `timeout`, the wait for queue room and the wait for the
    /// outcome together fail with `REQUEST_TIMEOUT` once it runs out.
    pub async fn request(
        &self,
        topic: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> AppResult<Value> {
        let (tx, rx) = oneshot::channel();

        let exchange = async {
            self.enqueue(
                topic,
                Request {
                    payload,
                    reply: Reply(Some(tx)),
                },
            )
            .await?;

            rx.await.unwrap_or_else(|_| {
                Err(AppError::service_unavailable(format!(
                    "{topic} stopped before replying"
                )))
            })
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::timeout(format!(
                        "No reply on {topic} within {limit:?}"
                    )))
                }),
            None => exchange.await,
        }
    }

    async fn enqueue(&self, topic: &str, request: Request) -> AppResult<()> {
        let queue = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned();

        let unavailable = || AppError::service_unavailable(format!("Nobody serves {topic}"));
        let queue = queue.ok_or_else(unavailable)?;

        if queue.send(request).await.is_err() {
            self.forget_closed(topic);
            return Err(unavailable());
        }
        Ok(())
    }

    /// Drop a request topic whose server has gone away
    fn forget_closed(&self, topic: &str) {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if queues.get(topic).is_some_and(mpsc::Sender::is_closed) {
            queues.remove(topic);
        }
    }

    /// Number of broadcast topics with a live channel
    pub fn topic_count(&self) -> usize {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of request topics with a server
    pub fn queue_count(&self) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(crate::application::config::DEFAULT_BUS_CAPACITY)
    }
}

//! Directory Daemon Entry Point
//!
//! Builds the user store and bus, then serves requests read as JSON lines
//! from stdin, writing one JSON line per outcome to stdout.
//! Uses `anyhow` for startup errors, but request-level errors are
//! `kernel::error::AppError` values written back as error lines.
//!
//! ```text
//! > {"topic": "wfm:user:auth", "payload": {"userIdentifier": "trever", "password": "123"}}
//! < {"topic":"wfm:user:auth","ok":true}
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use directory::infra::load_seed;
use directory::{
    DirectoryClient, DirectoryConfig, Dispatcher, Mediator, MemoryUserRepository, UserStore,
};
use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output lines buffered ahead of the stdout writer
const OUTPUT_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct RequestLine {
    topic: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Serialize)]
struct ResponseLine {
    topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl ResponseLine {
    fn new(topic: Option<String>, result: AppResult<Value>) -> Self {
        match result {
            Ok(value) => Self {
                topic,
                ok: Some(value),
                error: None,
            },
            Err(e) => Self {
                topic,
                ok: None,
                error: Some(e.to_json()),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stdout carries protocol output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directoryd=info,directory=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DirectoryConfig::from_env()?;
    tracing::info!(
        base_delay_ms = millis(config.base_delay),
        max_delay = ?config.max_delay,
        request_timeout = ?config.request_timeout,
        "Configuration loaded"
    );

    let engine = config.credential_engine()?;
    let store = Arc::new(UserStore::new(
        Arc::new(MemoryUserRepository::new()),
        engine,
    ));

    if let Some(path) = &config.seed_file {
        seed(&store, path).await?;
    }

    let mediator = Arc::new(Mediator::new(config.bus_capacity));
    let dispatcher = Dispatcher::start(Arc::clone(&mediator), Arc::clone(&store));
    let client = DirectoryClient::new(mediator).with_timeout(config.request_timeout);

    serve(client).await?;

    dispatcher.shutdown();
    tracing::info!("Input closed, shutting down");

    Ok(())
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Create every user listed in the seed file
///
/// A user that cannot be created is logged and skipped.
async fn seed(store: &UserStore<MemoryUserRepository>, path: &Path) -> anyhow::Result<()> {
    let users = load_seed(path).await?;
    let total = users.len();
    let mut created = 0usize;

    for new_user in users {
        let user_name = new_user.username.clone();
        match store.create(new_user).await {
            Ok(_) => created += 1,
            Err(e) => {
                tracing::warn!(user_name = %user_name, error = %e, "Seed user skipped");
            }
        }
    }

    tracing::info!(created, total, path = %path.display(), "Seed users loaded");
    Ok(())
}

/// Serve stdin until EOF, then drain requests still in flight
async fn serve(client: DirectoryClient) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<String>(OUTPUT_BUFFER);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let client = client.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            let response = handle_line(&client, &line).await;
            match serde_json::to_string(&response) {
                Ok(output) => {
                    if tx.send(output).await.is_err() {
                        tracing::warn!("Output closed before response was written");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to encode response"),
            }
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Request task failed");
        }
    }

    drop(tx);
    writer.await??;

    Ok(())
}

async fn handle_line(client: &DirectoryClient, line: &str) -> ResponseLine {
    let request = match serde_json::from_str::<RequestLine>(line) {
        Ok(request) => request,
        Err(e) => {
            let err = AppError::from(e).with_action("Send {\"topic\": \"...\", \"payload\": ...}");
            return ResponseLine::new(None, Err(err));
        }
    };

    tracing::debug!(topic = %request.topic, "Request received");
    let result = client.call(&request.topic, request.payload).await;
    match &result {
        Err(e) if e.is_server_error() => {
            tracing::warn!(topic = %request.topic, error = %e, "Request failed");
        }
        _ => {}
    }
    ResponseLine::new(Some(request.topic), result)
}

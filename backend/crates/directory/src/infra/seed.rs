//! Seed File Loader
//!
//! Reads a JSON array of creation payloads, each shaped like the
//! `wfm:user:create` request:
//!
//! ```json
//! [{ "username": "trever", "password": "123", "name": "Trever Smith" }]
//! ```

use std::path::Path;

use kernel::error::app_error::{AppError, AppResult};

use crate::domain::entity::NewUser;

pub async fn load_seed(path: &Path) -> AppResult<Vec<NewUser>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::from(e).with_action(format!("Check the seed file at {}", path.display()))
    })?;
    parse_seed(&contents)
}

pub fn parse_seed(contents: &str) -> AppResult<Vec<NewUser>> {
    Ok(serde_json::from_str(contents)?)
}

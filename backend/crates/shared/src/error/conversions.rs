//! Error conversions - From implementations for common error types
//!
//! Conversions from the I/O and JSON errors the directory hits into [`AppError`],
//! and the JSON wire form used when an error is published as a message.

use serde::{Deserialize, Serialize};

use super::app_error::AppError;
use super::kind::ErrorKind;

// ============================================================================
// Standard library conversions
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::TimedOut => ErrorKind::RequestTimeout,
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::InvalidInput => {
                ErrorKind::BadRequest
            }
            _ => ErrorKind::InternalServerError,
        };
        AppError::new(kind, "I/O operation failed").with_source(err)
    }
}

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// Wire form
// ============================================================================

/// エラーのメッセージ表現
///
/// `error:` トピックに publish されるペイロードです。
/// `source` はデバッグ専用のため含めません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl From<&AppError> for WireError {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message().to_string(),
            action: err.action().map(str::to_string),
        }
    }
}

impl From<WireError> for AppError {
    fn from(wire: WireError) -> Self {
        let err = AppError::new(wire.kind, wire.message);
        match wire.action {
            Some(action) => err.with_action(action),
            None => err,
        }
    }
}

impl AppError {
    /// JSON 値に変換（`error:` トピック用）
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(WireError::from(self))
            .unwrap_or_else(|_| serde_json::Value::String(self.message().to_string()))
    }

    /// `error:` トピックのペイロードから復元
    ///
    /// 構造化されていないペイロード（文字列など）は Internal Server Error として扱います。
    pub fn from_json(value: serde_json::Value) -> Self {
        match serde_json::from_value::<WireError>(value.clone()) {
            Ok(wire) => wire.into(),
            Err(_) => match value {
                serde_json::Value::String(message) => AppError::internal(message),
                other => AppError::internal(other.to_string()),
            },
        }
    }
}

//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by every request outcome.

use serde::{Deserialize, Serialize};

/// エラー種別の列挙体
///
/// リクエスト結果のエラー分類を定義します。
/// バス上では `SCREAMING_SNAKE_CASE` の文字列としてシリアライズされます。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::NotFound;
/// assert_eq!(kind.as_str(), "Not Found");
/// assert!(kind.is_client_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// リクエストが不正（デコード不能なペイロード、入力検証エラー）
    BadRequest,
    /// 認証失敗（ユーザー名・パスワードの照合に失敗）
    Unauthorized,
    /// 対象のレコードが見つからない
    NotFound,
    /// 期限内に結果が返らなかった
    RequestTimeout,
    /// 現在の状態と競合（一意制約違反など）
    Conflict,
    /// サーバー内部エラー（ハッシュ処理失敗、整合性違反）
    InternalServerError,
    /// サービス利用不可（購読者がいない、チャネルが閉じている）
    ServiceUnavailable,
}

impl ErrorKind {
    /// ユーザー向けの文字列表現を取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::BadRequest.as_str(), "Bad Request");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::RequestTimeout => "Request Timeout",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// サーバー側のエラーかどうかを判定
    ///
    /// これらのエラーはログに記録すべきです。
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InternalServerError | ErrorKind::ServiceUnavailable
        )
    }

    /// クライアント側のエラーかどうかを判定
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_server_error() {
        assert!(!ErrorKind::BadRequest.is_server_error());
        assert!(!ErrorKind::NotFound.is_server_error());
        assert!(ErrorKind::InternalServerError.is_server_error());
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
    }

    #[test]
    fn test_is_client_error() {
        assert!(ErrorKind::Unauthorized.is_client_error());
        assert!(ErrorKind::RequestTimeout.is_client_error());
        assert!(!ErrorKind::InternalServerError.is_client_error());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(ErrorKind::NotFound).unwrap();
        assert_eq!(json, serde_json::json!("NOT_FOUND"));

        let kind: ErrorKind = serde_json::from_value(serde_json::json!("UNAUTHORIZED")).unwrap();
        assert_eq!(kind, ErrorKind::Unauthorized);
    }
}

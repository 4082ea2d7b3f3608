//! Application Error
//!
//! [`AppError`] はクレートをまたいで受け渡すエラーです。
//! バスの `error:` トピックにはこの型の JSON 表現が流れます
//! （[`super::conversions::WireError`] を参照）。

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

type Message = Cow<'static, str>;
type Source = Box<dyn Error + Send + Sync + 'static>;

/// 統一エラー
///
/// `kind` と `message` は呼び出し元にそのまま届きます。
/// `source` はログ用で、ワイヤ表現には含まれません。
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::not_found("User not found").with_action("Check the user id");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.to_string(), "[Not Found] User not found (Action: Check the user id)");
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Message,
    action: Option<Message>,
    source: Option<Source>,
}

pub type AppResult<T> = Result<T, AppError>;

/// 種別ごとのショートカットコンストラクタ
macro_rules! kind_constructors {
    ($($(#[$doc:meta])* $name:ident => $kind:ident;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(message: impl Into<Message>) -> Self {
                Self::new(ErrorKind::$kind, message)
            }
        )*
    };
}

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Message>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            source: None,
        }
    }

    kind_constructors! {
        /// 不正なペイロード
        bad_request => BadRequest;
        /// 資格情報の不一致
        unauthorized => Unauthorized;
        not_found => NotFound;
        /// 応答待ちのタイムアウト
        timeout => RequestTimeout;
        conflict => Conflict;
        internal => InternalServerError;
        /// 購読者がいない
        service_unavailable => ServiceUnavailable;
    }

    /// 呼び出し元が次に取るべき行動
    #[inline]
    pub fn with_action(mut self, action: impl Into<Message>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// 原因となったエラー（ログ用）
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// サーバー側の障害かどうか（ログレベルの判断に使用）
    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("action", &self.action)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        match &self.action {
            Some(action) => write!(f, " (Action: {action})"),
            None => Ok(()),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// 外部エラーを種別とメッセージ付きで `AppError` に包む
pub trait ResultExt<T> {
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Message>) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Message>) -> AppResult<T> {
        self.map_err(|e| AppError::new(kind, message).with_source(e))
    }
}

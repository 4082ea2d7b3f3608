//! Directory Error Types
//!
//! This module provides directory-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

use crate::domain::value_object::user_id::UserId;

/// Message shared by every credential failure
///
/// Unknown user, wrong password and a failed verification all read the
/// same so the caller cannot tell them apart.
pub const CREDENTIALS_MESSAGE: &str = "User not found with supplied credentials";

/// Directory-specific result type alias
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Directory-specific error variants
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No record with the given id or user name
    #[error("User not found")]
    UserNotFound,

    /// Credential check failed (unknown user or wrong password)
    #[error("{}", CREDENTIALS_MESSAGE)]
    Unauthorized,

    /// User name already exists
    #[error("User name already exists")]
    UserNameTaken,

    /// A freshly generated id is already stored
    #[error("User id collision: {0}")]
    IdCollision(UserId),

    /// Malformed request data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Hashing or verification could not run
    #[error("Password hash error: {0}")]
    Hash(#[from] PasswordHashError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::UserNotFound => ErrorKind::NotFound,
            DirectoryError::Unauthorized => ErrorKind::Unauthorized,
            DirectoryError::UserNameTaken => ErrorKind::Conflict,
            DirectoryError::InvalidInput(_) => ErrorKind::BadRequest,
            DirectoryError::IdCollision(_)
            | DirectoryError::Hash(_)
            | DirectoryError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            DirectoryError::IdCollision(id) => {
                tracing::error!(user_id = %id, "User id collision");
            }
            DirectoryError::Hash(e) => {
                tracing::error!(error = %e, "Password hash error");
            }
            DirectoryError::Internal(msg) => {
                tracing::error!(message = %msg, "Directory internal error");
            }
            DirectoryError::Unauthorized => {
                tracing::warn!("Credential check failed");
            }
            _ => {
                tracing::debug!(error = %self, "Directory error");
            }
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        err.to_app_error()
    }
}

impl From<AppError> for DirectoryError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => DirectoryError::UserNotFound,
            ErrorKind::Unauthorized => DirectoryError::Unauthorized,
            ErrorKind::Conflict => DirectoryError::UserNameTaken,
            ErrorKind::BadRequest => DirectoryError::InvalidInput(err.message().to_string()),
            _ => DirectoryError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DirectoryError::UserNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(DirectoryError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(DirectoryError::UserNameTaken.kind(), ErrorKind::Conflict);
        assert_eq!(
            DirectoryError::Hash(PasswordHashError::InvalidHashFormat).kind(),
            ErrorKind::InternalServerError
        );
        assert_eq!(
            DirectoryError::IdCollision(UserId::new()).kind(),
            ErrorKind::InternalServerError
        );
    }

    #[test]
    fn test_credentials_message() {
        let app: AppError = DirectoryError::Unauthorized.into();
        assert_eq!(app.kind(), ErrorKind::Unauthorized);
        assert_eq!(app.message(), "User not found with supplied credentials");
    }

    #[test]
    fn test_round_trip_through_app_error() {
        let app: AppError = DirectoryError::UserNotFound.into();
        assert!(matches!(
            DirectoryError::from(app),
            DirectoryError::UserNotFound
        ));
    }
}

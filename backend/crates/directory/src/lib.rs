//! User Directory Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository trait, credential engine
//! - `application/` - User store, configuration, per-record locks
//! - `infra/` - In-memory repository, seed loader
//! - `presentation/` - Topics, mediator bus, dispatcher, typed client
//!
//! ## Features
//! - User records keyed by id and by unique user name
//! - Create, read, update and delete over a topic bus
//! - Password verification with an exponential failure backoff
//! - Password change (old password required) and reset
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, never returned to callers
//! - Every credential failure reads the same to the caller
//! - Delay of `(2^n - 1) * 500ms` before checking after `n` failures

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::{DirectoryConfig, UserDirectory, UserStore};
pub use error::{DirectoryError, DirectoryResult};
pub use infra::MemoryUserRepository;
pub use presentation::{DirectoryClient, Dispatcher, Mediator};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::{
        profile::Profile, user_id::UserId, user_name::UserName,
    };
}

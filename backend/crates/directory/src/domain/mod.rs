//! Domain Layer
//!
//! Contains entities, value objects, the repository trait and the
//! credential engine.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{NewUser, User, UserPatch, UserRecord};
pub use repository::{LocalUserRepository, UserRepository};
pub use services::CredentialEngine;

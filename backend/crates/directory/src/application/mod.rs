//! Application Layer
//!
//! The user store, its configuration and the service trait the
//! presentation layer drives.

pub mod config;
pub mod directory;
pub mod record_lock;
pub mod user_store;

// Re-exports
pub use config::{ConfigError, DirectoryConfig};
pub use directory::{LocalUserDirectory, UserDirectory};
pub use record_lock::RecordLocks;
pub use user_store::UserStore;

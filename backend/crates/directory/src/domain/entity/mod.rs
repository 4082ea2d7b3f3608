//! Domain Entities

pub mod user;

pub use user::{NewUser, User, UserPatch, UserRecord};

//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id, PHC string format)
//! - Exponential backoff for repeated credential failures

pub mod backoff;
pub mod password;

//! Value Object Module

pub mod profile;
pub mod user_id;
pub mod user_name;

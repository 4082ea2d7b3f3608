//! Infrastructure Layer
//!
//! Storage implementations and startup data loading.

pub mod memory;
pub mod seed;

pub use memory::MemoryUserRepository;
pub use seed::load_seed;

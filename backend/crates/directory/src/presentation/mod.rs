//! Presentation Layer
//!
//! Topic names, the in-process bus, request DTOs, the dispatcher that
//! serves requests and the typed client that sends them.

pub mod client;
pub mod dispatcher;
pub mod dto;
pub mod mediator;
pub mod topics;

pub use client::DirectoryClient;
pub use dispatcher::Dispatcher;
pub use mediator::Mediator;
pub use topics::Operation;

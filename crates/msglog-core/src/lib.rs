//! Core abstractions for the message log client.
//!
//! This crate provides the fundamental building blocks:
//! - `Message` - A record as returned by the remote log
//! - `MessageKind` - Typed control signal carried by a message body
//! - `LogService` - The remote service seam implemented by backends
//! - Configuration shared by the client layers

pub mod config;
pub mod message;
pub mod traits;

pub use config::{FunctionPaths, GatewayConfig, ServiceConfig, SettlePolicy};
pub use message::{CreationTime, Message, MessageKind, OutgoingMessage, SendArgs};
pub use traits::{LogService, ServiceError};

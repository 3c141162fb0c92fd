//! The remote log service seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{CreationTime, Message, SendArgs};

/// Failure reported by a log service backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The backend rejected the call.
    #[error("Application error: {0}")]
    Application(String),
    /// The call did not complete: network, decoding or anything unexpected.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Trait for remote message log backends.
///
/// Mirrors the functions the backend exposes. Implementations own one
/// reusable connection handle; all methods take `&self`.
#[async_trait]
pub trait LogService: Send + Sync {
    /// Append one message.
    async fn send(&self, args: &SendArgs) -> Result<(), ServiceError>;

    /// The newest `last_n` messages, oldest first.
    async fn list_recent(&self, last_n: usize) -> Result<Vec<Message>, ServiceError>;

    /// Every message, oldest first.
    async fn list_all(&self) -> Result<Vec<Message>, ServiceError>;

    /// Empty the whole collection.
    async fn clear_table(&self) -> Result<(), ServiceError>;

    /// Count messages whose `complete` flag is false.
    async fn scan_incompletes(&self) -> Result<u64, ServiceError>;

    /// The context window anchored at `reference_time`, oldest first.
    async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, ServiceError>;
}

#[async_trait]
impl<T> LogService for Arc<T>
where
    T: LogService + ?Sized,
{
    async fn send(&self, args: &SendArgs) -> Result<(), ServiceError> {
        (**self).send(args).await
    }

    async fn list_recent(&self, last_n: usize) -> Result<Vec<Message>, ServiceError> {
        (**self).list_recent(last_n).await
    }

    async fn list_all(&self) -> Result<Vec<Message>, ServiceError> {
        (**self).list_all().await
    }

    async fn clear_table(&self) -> Result<(), ServiceError> {
        (**self).clear_table().await
    }

    async fn scan_incompletes(&self) -> Result<u64, ServiceError> {
        (**self).scan_incompletes().await
    }

    async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, ServiceError> {
        (**self).context_messages(reference_time).await
    }
}

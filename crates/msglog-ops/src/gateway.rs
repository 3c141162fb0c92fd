//! Typed gateway over a remote log service.

use msglog_core::{
    CreationTime, GatewayConfig, LogService, Message, OutgoingMessage, ServiceError,
};

use crate::error::{GatewayError, PreconditionError};

/// Largest batch the backend accepts in one `send_batch` call.
pub const MAX_BATCH_SIZE: usize = 5;

/// Which messages a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// The newest `n` messages.
    Recent(usize),
    /// Every message.
    All,
}

/// Gateway translating local intent into remote calls.
///
/// Owns the service handle it is given; nothing is constructed implicitly.
/// Backend failures come back as [`GatewayError::Application`] or
/// [`GatewayError::Transport`] after being logged. Precondition violations
/// are raised before any remote call.
pub struct Gateway<S>
where
    S: LogService,
{
    service: S,
    config: GatewayConfig,
}

impl<S> Gateway<S>
where
    S: LogService,
{
    /// Create a new gateway.
    #[must_use]
    pub const fn new(service: S, config: GatewayConfig) -> Self {
        Self { service, config }
    }

    /// Scope used when the caller does not choose one.
    #[must_use]
    pub const fn default_scope(&self) -> ListScope {
        ListScope::Recent(self.config.default_limit)
    }

    /// Append one message.
    ///
    /// # Errors
    /// Returns error if the backend rejects the message or is unreachable.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<(), GatewayError> {
        let args = message.to_send_args();
        let result = self.service.send(&args).await;
        report("send", result)?;
        tracing::info!(author = %args.author, delay_ms = ?args.delay, "Message sent");
        Ok(())
    }

    /// Send up to [`MAX_BATCH_SIZE`] messages in order.
    ///
    /// Stops at the first failure. Returns the number of messages sent.
    ///
    /// # Errors
    /// Returns a precondition error for an empty or oversized batch, before
    /// anything is sent, and [`GatewayError::PartialBatch`] if a send fails.
    pub async fn send_batch(&self, messages: &[OutgoingMessage]) -> Result<usize, GatewayError> {
        check_batch(messages.len())?;

        for (sent, message) in messages.iter().enumerate() {
            if let Err(e) = self.send(message).await {
                return Err(GatewayError::PartialBatch {
                    sent,
                    total: messages.len(),
                    source: Box::new(e),
                });
            }
        }
        Ok(messages.len())
    }

    /// List messages, oldest first.
    ///
    /// An error means the read is indeterminate; it says nothing about
    /// whether the log is empty or unchanged.
    ///
    /// # Errors
    /// Returns a precondition error for a zero limit and a backend error if
    /// the query fails.
    pub async fn list(&self, scope: ListScope) -> Result<Vec<Message>, GatewayError> {
        let result = match scope {
            ListScope::Recent(0) => return Err(PreconditionError::ZeroLimit.into()),
            ListScope::Recent(limit) => self.service.list_recent(limit).await,
            ListScope::All => self.service.list_all().await,
        };
        let messages = report("list", result)?;
        tracing::debug!(?scope, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    /// Ask the backend to delete the most recent exchange.
    ///
    /// Deletion is scheduled server-side; this does not wait for it.
    ///
    /// # Errors
    /// Returns error if the request cannot be sent.
    pub async fn remove_recent(&self) -> Result<(), GatewayError> {
        self.send(&OutgoingMessage::deletion_request(&self.config.system_author))
            .await
    }

    /// Irreversibly empty the whole collection.
    ///
    /// # Errors
    /// Returns error if the backend call fails.
    pub async fn clear(&self) -> Result<(), GatewayError> {
        let result = self.service.clear_table().await;
        report("clear", result)?;
        tracing::info!("Collection cleared");
        Ok(())
    }

    /// Count messages not yet marked complete.
    ///
    /// # Errors
    /// Returns error if the backend call fails.
    pub async fn scan_incompletes(&self) -> Result<u64, GatewayError> {
        let result = self.service.scan_incompletes().await;
        report("scan_incompletes", result)
    }

    /// Read the backend's context window for `reference_time`.
    ///
    /// # Errors
    /// Returns error if the backend call fails.
    pub async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, GatewayError> {
        let result = self.service.context_messages(reference_time).await;
        report("get_context", result)
    }
}

fn check_batch(size: usize) -> Result<(), PreconditionError> {
    match size {
        0 => Err(PreconditionError::EmptyBatch),
        size if size > MAX_BATCH_SIZE => Err(PreconditionError::BatchTooLarge {
            size,
            max: MAX_BATCH_SIZE,
        }),
        _ => Ok(()),
    }
}

fn report<T>(operation: &'static str, result: Result<T, ServiceError>) -> Result<T, GatewayError> {
    result.map_err(|e| {
        match &e {
            ServiceError::Application(message) => {
                tracing::warn!("Backend rejected {operation}: {message}");
            }
            ServiceError::Transport(message) => {
                tracing::error!("Transport error during {operation}: {message}");
            }
        }
        GatewayError::from_service(operation, e)
    })
}

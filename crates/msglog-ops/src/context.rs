//! Context windows for downstream responders.

use msglog_core::{CreationTime, LogService, Message};
use serde::{Deserialize, Serialize};

use crate::{
    error::GatewayError,
    gateway::{Gateway, ListScope},
};

/// Role of a turn handed to a chat model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Messages the backend considers related to an anchor timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    pub anchor: CreationTime,
    pub messages: Vec<Message>,
}

impl ContextWindow {
    /// Render the window as a transcript.
    ///
    /// Messages by `responder` become assistant turns, everything else user
    /// turns. Incomplete messages (placeholders still being written) are
    /// left out.
    #[must_use]
    pub fn chat_turns(&self, responder: &str) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .filter(|m| m.is_complete())
            .map(|m| ChatTurn {
                role: if m.author == responder {
                    ChatRole::Assistant
                } else {
                    ChatRole::User
                },
                content: m.body.clone(),
            })
            .collect()
    }
}

/// Read-only resolver of context windows.
pub struct ContextResolver<'a, S>
where
    S: LogService,
{
    gateway: &'a Gateway<S>,
}

impl<'a, S> ContextResolver<'a, S>
where
    S: LogService,
{
    #[must_use]
    pub const fn new(gateway: &'a Gateway<S>) -> Self {
        Self { gateway }
    }

    /// Fetch the context window anchored at `reference_time`.
    ///
    /// # Errors
    /// Propagates the backend error; no partial window is returned.
    pub async fn get_context(
        &self,
        reference_time: CreationTime,
    ) -> Result<ContextWindow, GatewayError> {
        let messages = self.gateway.context_messages(reference_time).await?;
        tracing::debug!(anchor = %reference_time, count = messages.len(), "Resolved context");
        Ok(ContextWindow {
            anchor: reference_time,
            messages,
        })
    }

    /// Fetch the context window anchored at the newest message.
    ///
    /// Returns `None` when the log is empty.
    ///
    /// # Errors
    /// Propagates the backend error of either read.
    pub async fn get_latest_context(&self) -> Result<Option<ContextWindow>, GatewayError> {
        let newest = self.gateway.list(ListScope::Recent(1)).await?;
        match newest.last() {
            Some(message) => self.get_context(message.creation_time).await.map(Some),
            None => Ok(None),
        }
    }
}

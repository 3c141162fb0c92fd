//! Message records and the control kinds carried in message bodies.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// Body prefix that routes a message to the automated responder.
const AGENT_MARKER: &str = "@gpt";

/// Payload asking the backend to drop the most recent exchange.
const DELETE_PAYLOAD: &str = "*DEL*";

/// Server-assigned creation timestamp, in milliseconds since the Unix epoch.
///
/// The backend reports fractional milliseconds. Ordering uses
/// [`f64::total_cmp`] so the type can serve as a sort key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreationTime(f64);

impl CreationTime {
    /// Wrap a raw millisecond timestamp.
    #[must_use]
    pub const fn from_millis(millis: f64) -> Self {
        Self(millis)
    }

    /// Raw millisecond timestamp.
    #[must_use]
    pub const fn as_millis(self) -> f64 {
        self.0
    }
}

impl PartialEq for CreationTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CreationTime {}

impl PartialOrd for CreationTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CreationTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for CreationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as stored by the remote log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend document identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Creation timestamp; the only ordering key.
    #[serde(rename = "_creationTime")]
    pub creation_time: CreationTime,
    /// Sender identity.
    pub author: String,
    /// Free-text content.
    pub body: String,
    /// Whether the message is a finished unit of content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

impl Message {
    /// Messages without a `complete` flag count as complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete.unwrap_or(true)
    }
}

/// What a message asks of the backend.
///
/// The backend still speaks a free-text convention; [`MessageKind::to_body`]
/// and [`MessageKind::classify`] are the only places that know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary chat content.
    Content(String),
    /// Ask the backend to delete the most recent exchange.
    DeletionRequest,
    /// Prompt addressed to the automated responder.
    AgentDirective(String),
}

impl MessageKind {
    /// Render the kind as the body text the backend understands.
    ///
    /// Content starting with the responder marker is indistinguishable from
    /// a directive once rendered.
    #[must_use]
    pub fn to_body(&self) -> String {
        match self {
            Self::Content(text) => text.clone(),
            Self::DeletionRequest => format!("{AGENT_MARKER} {DELETE_PAYLOAD}"),
            Self::AgentDirective(prompt) => {
                if prompt.trim_start().starts_with(AGENT_MARKER) {
                    prompt.clone()
                } else {
                    format!("{AGENT_MARKER} {prompt}")
                }
            }
        }
    }

    /// Recover the kind of a stored body.
    #[must_use]
    pub fn classify(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed == DELETE_PAYLOAD {
            return Self::DeletionRequest;
        }
        match trimmed.strip_prefix(AGENT_MARKER) {
            Some(rest) if rest.trim() == DELETE_PAYLOAD => Self::DeletionRequest,
            Some(rest) => Self::AgentDirective(rest.trim().to_string()),
            None => Self::Content(body.to_string()),
        }
    }
}

/// A message the client intends to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub author: String,
    pub kind: MessageKind,
    /// Scheduling hint in milliseconds. Write-only.
    pub delay: Option<u64>,
}

impl OutgoingMessage {
    /// Ordinary content, sent verbatim.
    #[must_use]
    pub fn content(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(author, MessageKind::Content(body.into()))
    }

    /// A deletion request signed by `author`.
    #[must_use]
    pub fn deletion_request(author: impl Into<String>) -> Self {
        Self::new(author, MessageKind::DeletionRequest)
    }

    /// A prompt for the automated responder.
    #[must_use]
    pub fn agent_directive(author: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(author, MessageKind::AgentDirective(prompt.into()))
    }

    #[must_use]
    pub fn new(author: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            author: author.into(),
            kind,
            delay: None,
        }
    }

    /// Attach a scheduling delay.
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    /// Wire arguments for the remote `send` operation.
    #[must_use]
    pub fn to_send_args(&self) -> SendArgs {
        SendArgs {
            author: self.author.clone(),
            body: self.kind.to_body(),
            delay: self.delay,
        }
    }
}

/// Arguments of the remote `send` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendArgs {
    pub author: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_content() {
        assert_eq!(
            MessageKind::classify("hello there"),
            MessageKind::Content("hello there".to_string())
        );
    }

    #[test]
    fn test_deletion_request_renders_with_marker() {
        let body = MessageKind::DeletionRequest.to_body();
        assert_eq!(body, "@gpt *DEL*");
        assert_eq!(MessageKind::classify(&body), MessageKind::DeletionRequest);
        assert_eq!(MessageKind::classify("*DEL*"), MessageKind::DeletionRequest);
    }

    #[test]
    fn test_agent_directive_is_not_double_prefixed() {
        let kind = MessageKind::AgentDirective("@gpt what time is it".to_string());
        assert_eq!(kind.to_body(), "@gpt what time is it");

        let kind = MessageKind::AgentDirective("summarize".to_string());
        assert_eq!(kind.to_body(), "@gpt summarize");
        assert_eq!(
            MessageKind::classify(&kind.to_body()),
            MessageKind::AgentDirective("summarize".to_string())
        );
    }

    #[test]
    fn test_message_deserializes_from_wire_shape() {
        let json = r#"{
            "_id": "j57abc",
            "_creationTime": 1718100000123.5,
            "author": "Tan",
            "body": "hi"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "j57abc");
        assert_eq!(msg.creation_time, CreationTime::from_millis(1_718_100_000_123.5));
        assert!(msg.is_complete());
        assert_eq!(MessageKind::classify(&msg.body), MessageKind::Content("hi".to_string()));
    }

    #[test]
    fn test_creation_time_orders_totally() {
        let mut times = vec![
            CreationTime::from_millis(3.0),
            CreationTime::from_millis(1.5),
            CreationTime::from_millis(2.0),
        ];
        times.sort();
        assert_eq!(
            times,
            vec![
                CreationTime::from_millis(1.5),
                CreationTime::from_millis(2.0),
                CreationTime::from_millis(3.0),
            ]
        );
    }

    #[test]
    fn test_send_args_omit_missing_delay() {
        let args = OutgoingMessage::content("A", "hi").to_send_args();
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json, serde_json::json!({"author": "A", "body": "hi"}));

        let args = OutgoingMessage::content("A", "hi").with_delay(250).to_send_args();
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["delay"], 250);
    }
}

//! In-memory message log.
//!
//! Emulates the backend functions closely enough to exercise the client:
//! responder placeholders, scheduled deletion of the latest exchange and
//! delayed finalization all happen on spawned tasks after `send` returns.

use std::{
    sync::{Arc, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use msglog_core::{CreationTime, LogService, Message, MessageKind, SendArgs, ServiceError};
use uuid::Uuid;

/// Author of responder placeholders.
pub const RESPONDER_AUTHOR: &str = "ChatGPT";

/// Body of a responder placeholder before any output arrives.
pub const PLACEHOLDER_BODY: &str = "...";

/// Body written over the newest message when a deletion cannot be honoured.
pub const NOT_ENOUGH_MESSAGES: &str =
    "Sorry buddy, there aren't enough messages to do that! Try again :P";

/// How a deletion request is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionPolicy {
    /// Number of newest messages removed.
    pub span: usize,
    /// Time between the request and the removal.
    pub delay: Duration,
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        // Two user messages, the request itself and its placeholder.
        Self {
            span: 4,
            delay: Duration::ZERO,
        }
    }
}

/// Behaviour of the emulated backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPolicy {
    pub deletion: DeletionPolicy,
    /// Messages returned by a context query.
    pub context_window: usize,
    /// Largest `lastN` accepted by `list_recent`.
    pub max_page: usize,
    pub responder_author: String,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            deletion: DeletionPolicy::default(),
            context_window: 10,
            max_page: 100,
            responder_author: RESPONDER_AUTHOR.to_string(),
        }
    }
}

#[derive(Default)]
struct Inner {
    messages: Vec<Message>,
    last_time: f64,
}

impl Inner {
    fn next_time(&mut self) -> CreationTime {
        let now = now_millis();
        let next = if now > self.last_time {
            now
        } else {
            self.last_time + 1.0
        };
        self.last_time = next;
        CreationTime::from_millis(next)
    }

    fn insert(&mut self, author: &str, body: &str, complete: bool) -> String {
        let id = Uuid::new_v4().to_string();
        let creation_time = self.next_time();
        self.messages.push(Message {
            id: id.clone(),
            creation_time,
            author: author.to_string(),
            body: body.to_string(),
            complete: Some(complete),
        });
        id
    }

    fn remove_last(&mut self, span: usize) {
        if self.messages.len() < span {
            if let Some(newest) = self.messages.last_mut() {
                newest.body = NOT_ENOUGH_MESSAGES.to_string();
                newest.complete = Some(true);
            }
            return;
        }
        let keep = self.messages.len() - span;
        self.messages.truncate(keep);
    }

    fn finalize(&mut self, id: &str) {
        if let Some(msg) = self.messages.iter_mut().find(|m| m.id == id) {
            msg.complete = Some(true);
        }
    }
}

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

fn lock_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Transport(format!("memory log lock poisoned: {e}"))
}

/// In-memory log implementation.
///
/// Useful for development and tests.
/// Data is lost when the value is dropped.
#[derive(Clone)]
pub struct MemoryLogService {
    inner: Arc<RwLock<Inner>>,
    policy: MemoryPolicy,
}

impl MemoryLogService {
    /// Create an empty log with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(MemoryPolicy::default())
    }

    /// Create an empty log with a custom policy.
    #[must_use]
    pub fn with_policy(policy: MemoryPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            policy,
        }
    }

    fn schedule_deletion(&self) {
        let inner = Arc::clone(&self.inner);
        let DeletionPolicy { span, delay } = self.policy.deletion;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match inner.write() {
                Ok(mut guard) => guard.remove_last(span),
                Err(e) => tracing::error!("Scheduled deletion skipped: {e}"),
            }
        });
    }

    fn schedule_finalize(&self, id: String, delay: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match inner.write() {
                Ok(mut guard) => guard.finalize(&id),
                Err(e) => tracing::error!("Finalizing message {id} skipped: {e}"),
            }
        });
    }
}

impl Default for MemoryLogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogService for MemoryLogService {
    async fn send(&self, args: &SendArgs) -> Result<(), ServiceError> {
        if args.author.trim().is_empty() {
            return Err(ServiceError::Application("author must not be empty".to_string()));
        }

        let kind = MessageKind::classify(&args.body);
        let id = {
            let mut inner = self.inner.write().map_err(lock_error)?;
            let id = inner.insert(&args.author, &args.body, args.delay.is_none());
            if !matches!(kind, MessageKind::Content(_)) {
                inner.insert(&self.policy.responder_author, PLACEHOLDER_BODY, false);
            }
            id
        };

        if let Some(delay_ms) = args.delay {
            self.schedule_finalize(id, Duration::from_millis(delay_ms));
        }
        if kind == MessageKind::DeletionRequest {
            self.schedule_deletion();
        }
        Ok(())
    }

    async fn list_recent(&self, last_n: usize) -> Result<Vec<Message>, ServiceError> {
        if last_n == 0 || last_n > self.policy.max_page {
            return Err(ServiceError::Application(format!(
                "lastN must be between 1 and {}, got {last_n}",
                self.policy.max_page
            )));
        }
        let inner = self.inner.read().map_err(lock_error)?;
        let start = inner.messages.len().saturating_sub(last_n);
        Ok(inner.messages[start..].to_vec())
    }

    async fn list_all(&self) -> Result<Vec<Message>, ServiceError> {
        Ok(self.inner.read().map_err(lock_error)?.messages.clone())
    }

    async fn clear_table(&self) -> Result<(), ServiceError> {
        self.inner.write().map_err(lock_error)?.messages.clear();
        Ok(())
    }

    async fn scan_incompletes(&self) -> Result<u64, ServiceError> {
        let inner = self.inner.read().map_err(lock_error)?;
        let count = inner.messages.iter().filter(|m| !m.is_complete()).count();
        Ok(count as u64)
    }

    async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, ServiceError> {
        let inner = self.inner.read().map_err(lock_error)?;
        let upto = inner
            .messages
            .partition_point(|m| m.creation_time <= reference_time);
        let start = upto.saturating_sub(self.policy.context_window);
        Ok(inner.messages[start..upto].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(author: &str, body: &str) -> SendArgs {
        SendArgs {
            author: author.to_string(),
            body: body.to_string(),
            delay: None,
        }
    }

    fn bodies(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.body.as_str()).collect()
    }

    #[tokio::test]
    async fn test_send_appends_in_creation_order() {
        let log = MemoryLogService::new();
        log.send(&args("A", "one")).await.unwrap();
        log.send(&args("B", "two")).await.unwrap();
        log.send(&args("A", "three")).await.unwrap();

        let all = log.list_all().await.unwrap();
        assert_eq!(bodies(&all), vec!["one", "two", "three"]);
        assert!(all.windows(2).all(|w| w[0].creation_time < w[1].creation_time));
    }

    #[tokio::test]
    async fn test_list_recent_returns_tail_oldest_first() {
        let log = MemoryLogService::new();
        for body in ["a", "b", "c", "d"] {
            log.send(&args("A", body)).await.unwrap();
        }
        let recent = log.list_recent(2).await.unwrap();
        assert_eq!(bodies(&recent), vec!["c", "d"]);

        let recent = log.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 4);
    }

    #[tokio::test]
    async fn test_list_recent_rejects_out_of_range() {
        let log = MemoryLogService::new();
        assert!(matches!(
            log.list_recent(0).await,
            Err(ServiceError::Application(_))
        ));
        assert!(matches!(
            log.list_recent(101).await,
            Err(ServiceError::Application(_))
        ));
    }

    #[tokio::test]
    async fn test_deletion_request_removes_latest_exchange() {
        let log = MemoryLogService::new();
        log.send(&args("Tan", "keep me")).await.unwrap();
        log.send(&args("T", "x")).await.unwrap();
        log.send(&args("T", "y")).await.unwrap();
        log.send(&args("Python pinger", "@gpt *DEL*")).await.unwrap();

        // Request and placeholder are visible before the scheduled removal.
        let before = log.list_all().await.unwrap();
        assert_eq!(bodies(&before), vec!["keep me", "x", "y", "@gpt *DEL*", "..."]);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after = log.list_all().await.unwrap();
        assert_eq!(bodies(&after), vec!["keep me"]);
    }

    #[tokio::test]
    async fn test_deletion_with_too_few_messages_patches_newest() {
        let log = MemoryLogService::new();
        log.send(&args("Python pinger", "@gpt *DEL*")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let all = log.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].body, NOT_ENOUGH_MESSAGES);
        assert!(all[1].is_complete());
    }

    #[tokio::test]
    async fn test_agent_directive_leaves_incomplete_placeholder() {
        let log = MemoryLogService::new();
        log.send(&args("A", "@gpt hello")).await.unwrap();

        let all = log.list_all().await.unwrap();
        assert_eq!(all[1].author, RESPONDER_AUTHOR);
        assert_eq!(all[1].body, PLACEHOLDER_BODY);
        assert_eq!(log.scan_incompletes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delayed_send_finalizes_later() {
        let log = MemoryLogService::new();
        let mut delayed = args("A", "later");
        delayed.delay = Some(10);
        log.send(&delayed).await.unwrap();
        assert_eq!(log.scan_incompletes().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(log.scan_incompletes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_table_is_idempotent() {
        let log = MemoryLogService::new();
        log.send(&args("A", "one")).await.unwrap();
        log.clear_table().await.unwrap();
        assert!(log.list_all().await.unwrap().is_empty());
        log.clear_table().await.unwrap();
        assert!(log.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_window_ends_at_anchor() {
        let policy = MemoryPolicy {
            context_window: 3,
            ..MemoryPolicy::default()
        };
        let log = MemoryLogService::with_policy(policy);
        for body in ["a", "b", "c", "d", "e"] {
            log.send(&args("A", body)).await.unwrap();
        }
        let all = log.list_all().await.unwrap();
        let anchor = all[3].creation_time;

        let window = log.context_messages(anchor).await.unwrap();
        assert_eq!(bodies(&window), vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_empty_author_is_rejected() {
        let log = MemoryLogService::new();
        let err = log.send(&args("  ", "hi")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Application(_)));
        assert!(log.list_all().await.unwrap().is_empty());
    }
}

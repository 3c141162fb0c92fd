//! Test doubles shared by the operation tests.

use std::sync::Mutex;

use async_trait::async_trait;
use msglog_backend::MemoryLogService;
use msglog_core::{CreationTime, LogService, Message, SendArgs, ServiceError};

/// Wraps the memory backend, recording every call and optionally failing
/// a chosen send or the clear.
pub struct SpyService {
    inner: MemoryLogService,
    calls: Mutex<Vec<&'static str>>,
    sent: Mutex<Vec<SendArgs>>,
    fail_send_at: Mutex<Option<usize>>,
    fail_clear: Mutex<bool>,
}

impl SpyService {
    pub fn new(inner: MemoryLogService) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_send_at: Mutex::new(None),
            fail_clear: Mutex::new(false),
        }
    }

    /// Fail the send with this zero-based index (counting all sends so far).
    pub fn fail_send_at(&self, index: usize) {
        *self.fail_send_at.lock().unwrap() = Some(index);
    }

    /// Reject every `clear_table` call.
    pub fn fail_clear(&self) {
        *self.fail_clear.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn mutating_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(**call, "send" | "clear_table"))
            .count()
    }

    /// Arguments of every successful send.
    pub fn sent(&self) -> Vec<SendArgs> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LogService for SpyService {
    async fn send(&self, args: &SendArgs) -> Result<(), ServiceError> {
        let index = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == "send")
            .count();
        self.record("send");
        if *self.fail_send_at.lock().unwrap() == Some(index) {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }
        self.inner.send(args).await?;
        self.sent.lock().unwrap().push(args.clone());
        Ok(())
    }

    async fn list_recent(&self, last_n: usize) -> Result<Vec<Message>, ServiceError> {
        self.record("list_recent");
        self.inner.list_recent(last_n).await
    }

    async fn list_all(&self) -> Result<Vec<Message>, ServiceError> {
        self.record("list_all");
        self.inner.list_all().await
    }

    async fn clear_table(&self) -> Result<(), ServiceError> {
        self.record("clear_table");
        if *self.fail_clear.lock().unwrap() {
            return Err(ServiceError::Application("clearTable denied".to_string()));
        }
        self.inner.clear_table().await
    }

    async fn scan_incompletes(&self) -> Result<u64, ServiceError> {
        self.record("scan_incompletes");
        self.inner.scan_incompletes().await
    }

    async fn context_messages(
        &self,
        reference_time: CreationTime,
    ) -> Result<Vec<Message>, ServiceError> {
        self.record("context_messages");
        self.inner.context_messages(reference_time).await
    }
}

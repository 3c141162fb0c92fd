//! Self-test for read stability around scheduled deletions.

use std::time::{Duration, Instant};

use msglog_core::{LogService, OutgoingMessage, SettlePolicy};

use crate::{
    error::CheckError,
    gateway::{Gateway, ListScope},
};

/// Author of the probe messages.
pub const PROBE_AUTHOR: &str = "Test Author";

/// Body of the probe messages.
pub const PROBE_BODY: &str = "Test Message";

/// Result of a passing self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestReport {
    /// Reads needed before the list matched the baseline.
    pub attempts: u32,
    /// Messages in the baseline listing.
    pub baseline_len: usize,
    /// Wall time from the baseline read to the matching read.
    pub elapsed: Duration,
}

/// Runs the scripted send/delete sequence and checks the list settles back.
///
/// The check is probabilistic: deletion happens asynchronously on the
/// backend, so a failure means either a backend regression or a settle
/// policy too short for the deployment.
pub struct ConsistencyChecker<'a, S>
where
    S: LogService,
{
    gateway: &'a Gateway<S>,
    settle: SettlePolicy,
    scope: ListScope,
}

impl<'a, S> ConsistencyChecker<'a, S>
where
    S: LogService,
{
    /// Create a checker comparing the gateway's default listing.
    #[must_use]
    pub const fn new(gateway: &'a Gateway<S>, settle: SettlePolicy) -> Self {
        Self {
            gateway,
            settle,
            scope: gateway.default_scope(),
        }
    }

    /// Compare a different listing.
    #[must_use]
    pub const fn with_scope(mut self, scope: ListScope) -> Self {
        self.scope = scope;
        self
    }

    /// Send two probes and a deletion request, then poll until the listing
    /// equals the baseline taken before.
    ///
    /// # Errors
    /// Returns [`CheckError::Gateway`] if any call fails and
    /// [`CheckError::Unsettled`] if the listing never returns to baseline
    /// within the settle policy.
    pub async fn run_self_test(&self) -> Result<SelfTestReport, CheckError> {
        let started = Instant::now();
        let baseline = self.gateway.list(self.scope).await?;
        tracing::info!(
            count = baseline.len(),
            budget_ms = self.settle.budget().as_millis(),
            "Captured baseline listing"
        );

        let probe = OutgoingMessage::content(PROBE_AUTHOR, PROBE_BODY);
        self.gateway.send(&probe).await?;
        self.gateway.send(&probe).await?;
        self.gateway.remove_recent().await?;

        let max_attempts = self.settle.max_attempts.max(1);
        let mut observed = Vec::new();
        for attempt in 1..=max_attempts {
            tokio::time::sleep(self.settle.interval).await;
            observed = self.gateway.list(self.scope).await?;
            if observed == baseline {
                let report = SelfTestReport {
                    attempts: attempt,
                    baseline_len: baseline.len(),
                    elapsed: started.elapsed(),
                };
                tracing::info!(
                    attempts = report.attempts,
                    elapsed_ms = report.elapsed.as_millis(),
                    "Self-test passed"
                );
                return Ok(report);
            }
            tracing::debug!(attempt, max_attempts, "Listing has not settled yet");
        }

        tracing::warn!(
            max_attempts,
            interval_ms = self.settle.interval.as_millis(),
            budget_ms = self.settle.budget().as_millis(),
            "Self-test failed: listing did not return to baseline"
        );
        Err(CheckError::Unsettled {
            attempts: max_attempts,
            baseline,
            observed,
        })
    }

    /// Count messages the backend reports as incomplete.
    ///
    /// # Errors
    /// Returns error if the backend call fails.
    pub async fn scan_incompletes(&self) -> Result<u64, CheckError> {
        let count = self.gateway.scan_incompletes().await?;
        tracing::info!(count, "Scanned for incomplete messages");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use msglog_backend::{DeletionPolicy, MemoryLogService, MemoryPolicy};
    use msglog_core::GatewayConfig;

    use super::*;
    use crate::{error::GatewayError, testing::SpyService};

    fn fast_settle() -> SettlePolicy {
        SettlePolicy::new(Duration::from_millis(10), 20)
    }

    fn gateway_with(policy: MemoryPolicy) -> Gateway<MemoryLogService> {
        Gateway::new(MemoryLogService::with_policy(policy), GatewayConfig::default())
    }

    #[tokio::test]
    async fn test_self_test_passes_on_empty_log() {
        let gateway = gateway_with(MemoryPolicy::default());
        let report = ConsistencyChecker::new(&gateway, fast_settle())
            .run_self_test()
            .await
            .unwrap();
        assert_eq!(report.baseline_len, 0);
        assert!(report.attempts >= 1);
        assert!(gateway.list(ListScope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_test_preserves_existing_messages() {
        let gateway = gateway_with(MemoryPolicy::default());
        for body in ["a", "b", "c"] {
            gateway
                .send(&OutgoingMessage::content("Tan", body))
                .await
                .unwrap();
        }

        let report = ConsistencyChecker::new(&gateway, fast_settle())
            .run_self_test()
            .await
            .unwrap();
        assert_eq!(report.baseline_len, 3);
    }

    #[tokio::test]
    async fn test_self_test_polls_through_slow_deletion() {
        let policy = MemoryPolicy {
            deletion: DeletionPolicy {
                span: 4,
                delay: Duration::from_millis(35),
            },
            ..MemoryPolicy::default()
        };
        let gateway = gateway_with(policy);

        let report = ConsistencyChecker::new(&gateway, fast_settle())
            .run_self_test()
            .await
            .unwrap();
        assert!(report.attempts > 1);
    }

    #[tokio::test]
    async fn test_self_test_fails_when_deletion_never_lands() {
        let policy = MemoryPolicy {
            deletion: DeletionPolicy {
                span: 4,
                delay: Duration::from_secs(60),
            },
            ..MemoryPolicy::default()
        };
        let gateway = gateway_with(policy);

        let err = ConsistencyChecker::new(&gateway, SettlePolicy::new(Duration::from_millis(5), 3))
            .run_self_test()
            .await
            .unwrap_err();
        match err {
            CheckError::Unsettled {
                attempts,
                baseline,
                observed,
            } => {
                assert_eq!(attempts, 3);
                assert!(baseline.is_empty());
                assert_eq!(observed.len(), 4);
            }
            other => panic!("expected unsettled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_self_test_surfaces_gateway_failure() {
        let spy = Arc::new(SpyService::new(MemoryLogService::new()));
        spy.fail_send_at(1);
        let gateway = Gateway::new(Arc::clone(&spy), GatewayConfig::default());

        let err = ConsistencyChecker::new(&gateway, fast_settle())
            .run_self_test()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckError::Gateway(GatewayError::Transport { operation: "send", .. })
        ));
    }

    #[tokio::test]
    async fn test_scan_incompletes_counts_placeholders() {
        let gateway = gateway_with(MemoryPolicy::default());
        gateway
            .send(&OutgoingMessage::agent_directive("A", "hello?"))
            .await
            .unwrap();

        let checker = ConsistencyChecker::new(&gateway, fast_settle());
        assert_eq!(checker.scan_incompletes().await.unwrap(), 1);
    }
}

//! Replace the live collection with a seed, document by document.

use msglog_core::LogService;
use serde_json::Value;

use crate::{
    error::{GatewayError, ReconcileError},
    gateway::{Gateway, MAX_BATCH_SIZE},
    seed::Seed,
};

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Messages sent after the clear.
    pub sent: usize,
    /// Batches used to send them.
    pub batches: usize,
}

/// Seed reconciler built on the gateway primitives.
///
/// The writes are not transactional. If the clear succeeds and a later send
/// fails, the collection stays partially populated and the error says how
/// far it got; running the reconciliation again converges.
///
/// Seed bodies are sent verbatim, so the backend still acts on control
/// bodies: a document starting with `@gpt` gets a responder placeholder and
/// `@gpt *DEL*` schedules a deletion inside the freshly seeded collection.
/// Such a seed does not list back as written.
pub struct SeedReconciler<'a, S>
where
    S: LogService,
{
    gateway: &'a Gateway<S>,
    batch_size: usize,
}

impl<'a, S> SeedReconciler<'a, S>
where
    S: LogService,
{
    /// Create a reconciler sending full batches.
    #[must_use]
    pub const fn new(gateway: &'a Gateway<S>) -> Self {
        Self {
            gateway,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Use smaller batches. Clamped to `1..=MAX_BATCH_SIZE`.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Validate a raw `{"data": [...]}` seed, then apply it.
    ///
    /// Validation covers every document before the collection is touched.
    ///
    /// # Errors
    /// Returns [`ReconcileError::Seed`] without any remote call if the seed
    /// is invalid, otherwise see [`SeedReconciler::apply`].
    pub async fn replace_with_seed(&self, seed: &Value) -> Result<ReconcileReport, ReconcileError> {
        let seed = Seed::from_value(seed)?;
        self.apply(&seed).await
    }

    /// Clear the collection and re-send every seed document in order.
    ///
    /// # Errors
    /// Returns [`ReconcileError::Clear`] if nothing was sent, or
    /// [`ReconcileError::PartiallyApplied`] if sending stopped midway.
    pub async fn apply(&self, seed: &Seed) -> Result<ReconcileReport, ReconcileError> {
        let total = seed.len();
        tracing::info!(total, batch_size = self.batch_size, "Replacing collection with seed");

        self.gateway.clear().await.map_err(ReconcileError::Clear)?;

        let messages = seed.messages();
        let mut report = ReconcileReport {
            sent: 0,
            batches: 0,
        };
        for batch in messages.chunks(self.batch_size) {
            match self.gateway.send_batch(batch).await {
                Ok(sent) => {
                    report.sent += sent;
                    report.batches += 1;
                }
                Err(GatewayError::PartialBatch { sent, source, .. }) => {
                    return Err(partially_applied(report.sent + sent, total, *source));
                }
                Err(e) => return Err(partially_applied(report.sent, total, e)),
            }
        }

        tracing::info!(sent = report.sent, batches = report.batches, "Seed applied");
        Ok(report)
    }
}

fn partially_applied(sent: usize, total: usize, source: GatewayError) -> ReconcileError {
    tracing::error!(
        sent,
        total,
        "Seed only partially applied, re-run reconciliation: {source}"
    );
    ReconcileError::PartiallyApplied {
        sent,
        total,
        source,
    }
}

//! Operations on the message log.
//!
//! Provides:
//! - `Gateway` - Typed send/list/delete operations over a `LogService`
//! - `SeedReconciler` - Replace the live collection with a seed
//! - `ConsistencyChecker` - Self-test and incompleteness scan
//! - `ContextResolver` - Context window reads keyed on a timestamp

pub mod checker;
pub mod context;
pub mod error;
pub mod gateway;
pub mod reconciler;
pub mod seed;

#[cfg(test)]
mod testing;

pub use checker::{ConsistencyChecker, SelfTestReport};
pub use context::{ChatRole, ChatTurn, ContextResolver, ContextWindow};
pub use error::{CheckError, GatewayError, PreconditionError, ReconcileError, SeedError};
pub use gateway::{Gateway, ListScope, MAX_BATCH_SIZE};
pub use reconciler::{ReconcileReport, SeedReconciler};
pub use seed::{Seed, SeedDocument};

//! Error types for message log operations.

use std::path::PathBuf;

use msglog_core::{Message, ServiceError};
use thiserror::Error;

/// Local misuse detected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Batch must contain at least one message")]
    EmptyBatch,
    #[error("Batch of {size} messages exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
    #[error("List limit must be positive")]
    ZeroLimit,
}

/// Gateway error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Backend rejected {operation}: {message}")]
    Application {
        operation: &'static str,
        message: String,
    },
    #[error("Transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("Batch stopped after {sent} of {total} messages: {source}")]
    PartialBatch {
        sent: usize,
        total: usize,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Attach the operation name to a backend failure.
    #[must_use]
    pub fn from_service(operation: &'static str, err: ServiceError) -> Self {
        match err {
            ServiceError::Application(message) => Self::Application { operation, message },
            ServiceError::Transport(message) => Self::Transport { operation, message },
        }
    }
}

/// Seed document validation error.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed seed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed seed JSON on line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Seed has no top-level `data` field")]
    MissingData,
    #[error("Seed `data` must be an array")]
    DataNotArray,
    #[error("Seed contains no documents")]
    Empty,
    #[error("Seed document {index} is not an object")]
    NotAnObject { index: usize },
    #[error("Seed document {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("Seed document {index} has a non-{expected} `{field}`")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },
}

/// Seed reconciliation error.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Invalid seed: {0}")]
    Seed(#[from] SeedError),
    #[error("Clearing the collection failed, nothing was sent: {0}")]
    Clear(#[source] GatewayError),
    #[error(
        "Collection left partially populated ({sent} of {total} messages sent), re-run reconciliation: {source}"
    )]
    PartiallyApplied {
        sent: usize,
        total: usize,
        #[source]
        source: GatewayError,
    },
}

/// Consistency check error.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(
        "List did not return to baseline after {attempts} reads ({} baseline vs {} observed messages)",
        .baseline.len(),
        .observed.len()
    )]
    Unsettled {
        attempts: u32,
        baseline: Vec<Message>,
        observed: Vec<Message>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_service_keeps_kind_and_operation() {
        let err = GatewayError::from_service("send", ServiceError::Application("nope".into()));
        assert_eq!(err.to_string(), "Backend rejected send: nope");

        let err = GatewayError::from_service("list", ServiceError::Transport("reset".into()));
        assert_eq!(err.to_string(), "Transport error during list: reset");
    }

    #[test]
    fn test_partial_batch_message() {
        let err = GatewayError::PartialBatch {
            sent: 2,
            total: 5,
            source: Box::new(GatewayError::Transport {
                operation: "send",
                message: "timeout".into(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "Batch stopped after 2 of 5 messages: Transport error during send: timeout"
        );
    }
}

//! Out-of-band administration of the message log deployment.
//!
//! Provides:
//! - `BulkImporter` - Replace a table wholesale through the backend's import command
//! - Command building and executable resolution utilities
//!
//! This path bypasses the gateway entirely and needs administrative access
//! to the deployment.

pub mod command;
pub mod import;
pub mod shell;

pub use command::{CommandBuildError, CommandBuilder, CommandParts};
pub use import::{BulkImporter, ImportConfig, ImportError, ImportOutcome};
pub use shell::resolve_executable_path;

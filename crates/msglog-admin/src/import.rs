//! Wholesale table replacement through the backend's import command.
//!
//! Unlike seed reconciliation this does not go through the gateway: the
//! backend swaps the table contents for a newline-delimited JSON file in one
//! step. It is fast, unaudited and needs administrative credentials.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use thiserror::Error;
use tokio::process::Command;

use crate::command::{CommandBuildError, CommandBuilder};

/// Name of the file imported to wipe a table.
pub const EMPTY_IMPORT_FILE: &str = "empty_file.jsonl";

/// Import error.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import file does not exist: {0}")]
    MissingFile(PathBuf),
    #[error("Command error: {0}")]
    Command(#[from] CommandBuildError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Import exited with {}: {stderr}", exit_label(.code.as_ref()))]
    Failed { code: Option<i32>, stderr: String },
}

fn exit_label(code: Option<&i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |code| format!("status {code}"))
}

/// Bulk import settings.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Base command of the backend CLI.
    pub command: String,
    pub deployment_url: String,
    pub admin_key: Option<String>,
    pub table: String,
    /// Where generated import files are written.
    pub scratch_dir: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            command: "npx convex".to_string(),
            deployment_url: "http://127.0.0.1:3210".to_string(),
            admin_key: None,
            table: "messages".to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub table: String,
    pub file: PathBuf,
    pub stdout: String,
}

/// Runs the backend's import command.
#[derive(Debug, Clone)]
pub struct BulkImporter {
    config: ImportConfig,
}

impl BulkImporter {
    #[must_use]
    pub const fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Replace the table with nothing.
    ///
    /// # Errors
    /// Returns error if the empty file cannot be written or the import fails.
    pub async fn wipe(&self) -> Result<ImportOutcome, ImportError> {
        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;
        let file = self.config.scratch_dir.join(EMPTY_IMPORT_FILE);
        tokio::fs::write(&file, b"").await?;
        self.run(&file).await
    }

    /// Replace the table with the documents in `file`.
    ///
    /// # Errors
    /// Returns [`ImportError::MissingFile`] before spawning anything if the
    /// file does not exist, or an error if the import fails.
    pub async fn populate(&self, file: &Path) -> Result<ImportOutcome, ImportError> {
        if !tokio::fs::try_exists(file).await.unwrap_or(false) {
            return Err(ImportError::MissingFile(file.to_path_buf()));
        }
        self.run(file).await
    }

    fn builder(&self) -> CommandBuilder {
        CommandBuilder::new(&self.config.command).params([
            "import",
            "--replace",
            "--table",
            self.config.table.as_str(),
        ])
    }

    fn trailing_args(&self, file: &Path) -> Vec<String> {
        let mut args = vec![file.display().to_string()];
        if let Some(key) = &self.config.admin_key {
            args.push("--admin-key".to_string());
            args.push(key.clone());
        }
        args.push("--url".to_string());
        args.push(self.config.deployment_url.clone());
        args
    }

    async fn run(&self, file: &Path) -> Result<ImportOutcome, ImportError> {
        let parts = self.builder().build(&self.trailing_args(file))?;
        let (program, args) = parts.into_resolved().await?;

        tracing::info!(
            table = %self.config.table,
            file = %file.display(),
            url = %self.config.deployment_url,
            "Running bulk import"
        );

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(code = ?output.status.code(), "Bulk import failed: {stderr}");
            return Err(ImportError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        tracing::info!(table = %self.config.table, "Bulk import finished");
        Ok(ImportOutcome {
            table: self.config.table.clone(),
            file: file.to_path_buf(),
            stdout,
        })
    }
}

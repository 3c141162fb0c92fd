use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use msglog_core::{GatewayConfig, ServiceConfig, SettlePolicy, config::DEFAULT_DEPLOYMENT_URL};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_timestamp(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|error| format!("failed to parse timestamp: {error}"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("timestamp must be a finite, non-negative number".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Convex deployment over HTTP.
    Convex,
    /// In-process log, discarded on exit.
    Memory,
}

#[derive(Debug, Parser)]
#[command(
    name = "msglog",
    about = "Administer and exercise a remote message log",
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "MSGLOG_BACKEND",
        value_enum,
        default_value = "convex"
    )]
    pub backend: BackendKind,

    #[arg(
        long,
        global = true,
        env = "MSGLOG_URL",
        default_value = DEFAULT_DEPLOYMENT_URL,
        help = "Base URL of the deployment"
    )]
    pub url: String,

    #[arg(
        long = "admin-key",
        global = true,
        env = "MSGLOG_ADMIN_KEY",
        hide_env_values = true,
        help = "Admin key passed through to the deployment"
    )]
    pub admin_key: Option<String>,

    #[arg(
        long = "timeout-ms",
        global = true,
        env = "MSGLOG_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Per-request timeout in milliseconds"
    )]
    pub timeout_ms: u64,

    #[arg(
        long = "system-author",
        global = true,
        env = "MSGLOG_SYSTEM_AUTHOR",
        help = "Author of deletion requests"
    )]
    pub system_author: Option<String>,

    #[arg(
        long = "settle-interval-ms",
        global = true,
        env = "MSGLOG_SETTLE_INTERVAL_MS",
        default_value_t = 100,
        value_parser = parse_positive_u64,
        help = "Wait before each verification read"
    )]
    pub settle_interval_ms: u64,

    #[arg(
        long = "settle-attempts",
        global = true,
        env = "MSGLOG_SETTLE_ATTEMPTS",
        default_value_t = 10,
        value_parser = parse_positive_u32,
        help = "Verification reads before the self-test gives up"
    )]
    pub settle_attempts: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append one message.
    Send {
        author: String,
        body: String,
        /// Ask the backend to finalize the message after this many milliseconds.
        #[arg(long)]
        delay: Option<u64>,
        /// Address the body to the agent.
        #[arg(long)]
        agent: bool,
    },
    /// List recent messages, oldest first.
    List {
        #[arg(long, value_parser = parse_positive_usize, conflicts_with = "all")]
        limit: Option<usize>,
        #[arg(long)]
        all: bool,
    },
    /// Request deletion of the most recent messages.
    RemoveRecent,
    /// Delete every message.
    Clear,
    /// Replace the log with the documents of a seed file.
    Seed {
        file: PathBuf,
        #[arg(long = "batch-size", default_value_t = 5, value_parser = parse_positive_usize)]
        batch_size: usize,
    },
    /// Send probes and a deletion request, then check the listing settles back.
    SelfTest,
    /// Count messages still marked incomplete.
    ScanIncompletes,
    /// Show the context window around a creation time.
    Context {
        /// Anchor creation time in milliseconds; defaults to the newest message.
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<f64>,
        /// Render as chat turns instead of raw messages.
        #[arg(long)]
        turns: bool,
        #[arg(long, default_value = "ChatGPT")]
        responder: String,
    },
    /// Replace a table wholesale through the deployment's import command.
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(long, global = true, default_value = "messages")]
    pub table: String,

    #[arg(
        long = "command",
        global = true,
        env = "MSGLOG_CONVEX_COMMAND",
        default_value = "npx convex",
        help = "Deployment CLI used to run the import"
    )]
    pub import_command: String,

    #[command(subcommand)]
    pub action: ImportAction,
}

#[derive(Debug, Subcommand)]
pub enum ImportAction {
    /// Import an empty file.
    Wipe,
    /// Import a newline-delimited JSON file.
    Populate { file: PathBuf },
}

impl Cli {
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(self.url.clone())
            .with_request_timeout(Duration::from_millis(self.timeout_ms));
        if let Some(key) = &self.admin_key {
            config = config.with_admin_key(key.clone());
        }
        config
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        if let Some(author) = &self.system_author {
            config.system_author.clone_from(author);
        }
        config
    }

    pub const fn settle_policy(&self) -> SettlePolicy {
        SettlePolicy::new(
            Duration::from_millis(self.settle_interval_ms),
            self.settle_attempts,
        )
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_build_configs() {
        let cli = Cli::try_parse_from(["msglog", "--backend", "memory", "self-test"]).unwrap();
        assert_eq!(cli.backend, BackendKind::Memory);
        assert_eq!(cli.settle_policy(), SettlePolicy::default());
        assert_eq!(cli.gateway_config(), GatewayConfig::default());
        assert_eq!(cli.service_config().request_timeout, Duration::from_secs(30));
        assert!(matches!(cli.command, Command::SelfTest));
    }

    #[test]
    fn test_flags_override_configs() {
        let cli = Cli::try_parse_from([
            "msglog",
            "--url",
            "https://example.convex.cloud",
            "--admin-key",
            "k",
            "--system-author",
            "ops",
            "list",
            "--limit",
            "3",
        ])
        .unwrap();
        let service = cli.service_config();
        assert_eq!(service.deployment_url, "https://example.convex.cloud");
        assert_eq!(service.admin_key.as_deref(), Some("k"));
        assert_eq!(cli.gateway_config().system_author, "ops");
        assert!(matches!(
            cli.command,
            Command::List {
                limit: Some(3),
                all: false
            }
        ));
    }

    #[test]
    fn test_list_limit_and_all_conflict() {
        assert!(Cli::try_parse_from(["msglog", "list", "--limit", "2", "--all"]).is_err());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        assert!(Cli::try_parse_from(["msglog", "list", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_import_populate_parses_table() {
        let cli = Cli::try_parse_from([
            "msglog",
            "import",
            "populate",
            "docs.jsonl",
            "--table",
            "archive",
        ])
        .unwrap();
        let Command::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.table, "archive");
        assert!(matches!(args.action, ImportAction::Populate { file } if file == PathBuf::from("docs.jsonl")));
    }
}

//! `msglog` - operator CLI for the message log.
//!
//! Run with: cargo run -p msglog-cli -- --help
//!
//! Results go to stdout as JSON, logs to stderr.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use msglog_admin::{BulkImporter, ImportConfig};
use msglog_backend::{ConvexLogService, MemoryLogService};
use msglog_core::{CreationTime, LogService, OutgoingMessage};
use msglog_ops::{
    ConsistencyChecker, ContextResolver, Gateway, ListScope, Seed, SeedReconciler,
};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{BackendKind, Cli, Command, ImportAction, ImportArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Import(args) = &cli.command {
        return run_import(&cli, args).await;
    }

    let service = connect(&cli)?;
    let gateway = Gateway::new(service, cli.gateway_config());
    run(&cli, &gateway).await
}

fn connect(cli: &Cli) -> Result<Arc<dyn LogService>> {
    match cli.backend {
        BackendKind::Convex => {
            let service = ConvexLogService::new(&cli.service_config())
                .context("failed to build deployment client")?;
            tracing::debug!(url = %cli.url, "Using Convex backend");
            Ok(Arc::new(service))
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; nothing outlives this process");
            Ok(Arc::new(MemoryLogService::new()))
        }
    }
}

async fn run(cli: &Cli, gateway: &Gateway<Arc<dyn LogService>>) -> Result<()> {
    match &cli.command {
        Command::Send {
            author,
            body,
            delay,
            agent,
        } => {
            let mut message = if *agent {
                OutgoingMessage::agent_directive(author.as_str(), body.as_str())
            } else {
                OutgoingMessage::content(author.as_str(), body.as_str())
            };
            if let Some(delay) = delay {
                message = message.with_delay(*delay);
            }
            gateway.send(&message).await.context("send failed")?;
            print_json(&json!({ "sent": message.to_send_args() }))
        }
        Command::List { limit, all } => {
            let scope = match (*limit, *all) {
                (_, true) => ListScope::All,
                (Some(n), false) => ListScope::Recent(n),
                (None, false) => gateway.default_scope(),
            };
            let messages = gateway.list(scope).await.context("list failed")?;
            print_json(&messages)
        }
        Command::RemoveRecent => {
            gateway
                .remove_recent()
                .await
                .context("deletion request failed")?;
            print_json(&json!({ "requested": true }))
        }
        Command::Clear => {
            gateway.clear().await.context("clear failed")?;
            print_json(&json!({ "cleared": true }))
        }
        Command::Seed { file, batch_size } => {
            let seed = Seed::from_path(file)
                .with_context(|| format!("invalid seed file {}", file.display()))?;
            let report = SeedReconciler::new(gateway)
                .with_batch_size(*batch_size)
                .apply(&seed)
                .await
                .context("seed reconciliation failed")?;
            print_json(&json!({ "sent": report.sent, "batches": report.batches }))
        }
        Command::SelfTest => {
            let report = ConsistencyChecker::new(gateway, cli.settle_policy())
                .run_self_test()
                .await
                .context("self-test failed")?;
            print_json(&json!({
                "passed": true,
                "attempts": report.attempts,
                "baseline_len": report.baseline_len,
                "elapsed_ms": report.elapsed.as_millis(),
            }))
        }
        Command::ScanIncompletes => {
            let count = ConsistencyChecker::new(gateway, cli.settle_policy())
                .scan_incompletes()
                .await
                .context("scan failed")?;
            print_json(&json!({ "incomplete": count }))
        }
        Command::Context {
            at,
            turns,
            responder,
        } => {
            let resolver = ContextResolver::new(gateway);
            let window = match at {
                Some(at) => resolver
                    .get_context(CreationTime::from_millis(*at))
                    .await
                    .map(Some),
                None => resolver.get_latest_context().await,
            }
            .context("context read failed")?;
            match window {
                Some(window) if *turns => print_json(&window.chat_turns(responder)),
                Some(window) => print_json(&window),
                None => print_json(&json!(null)),
            }
        }
        Command::Import(args) => run_import(cli, args).await,
    }
}

async fn run_import(cli: &Cli, args: &ImportArgs) -> Result<()> {
    let importer = BulkImporter::new(ImportConfig {
        command: args.import_command.clone(),
        deployment_url: cli.url.clone(),
        admin_key: cli.admin_key.clone(),
        table: args.table.clone(),
        ..ImportConfig::default()
    });

    let outcome = match &args.action {
        ImportAction::Wipe => importer.wipe().await,
        ImportAction::Populate { file } => importer.populate(file).await,
    }
    .context("bulk import failed")?;

    print_json(&json!({
        "table": outcome.table,
        "file": outcome.file,
        "output": outcome.stdout.trim(),
    }))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

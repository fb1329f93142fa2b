use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use vecready_api::QdrantClient;
use vecready_server::config::ServerConfig;
use vecready_server::context::Context;
use vecready_server::liveness::VERSION;
use vecready_server::logger::LoggerRegistry;
use vecready_server::server;
use vecready_server::telemetry::{LogFormat, LogOutput, LogSink, Severity};

#[derive(Parser)]
#[command(
    name = "vecready",
    version,
    about = "Liveness and readiness endpoints for a Qdrant-backed service"
)]
struct Cli {
    /// Port for the health server (overrides HEALTH_PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Log level: DEBUG, INFO, WARNING, ERROR or CRITICAL (overrides LOG_LEVEL).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single readiness check, print the result as JSON and exit
    /// non-zero if the service is not ready.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let sink = LogSink::install(LogFormat::from_env())?;

    let cli = Cli::parse();
    let checking = matches!(cli.command, Some(Commands::Check));
    if checking {
        // stdout carries only the JSON report, config warnings included.
        sink.reconfigure(Severity::default().as_str(), LogOutput::Stderr);
    }

    let mut config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let client = QdrantClient::with_timeout(
        &config.qdrant_url,
        config.qdrant_api_key.as_deref(),
        &config.collection,
        config.probe_timeout,
    )?;
    let loggers = Arc::new(LoggerRegistry::new());
    let ctx = Arc::new(Context::new(
        Arc::new(client),
        config.probe_timeout,
        loggers,
    ));

    if checking {
        sink.reconfigure(&config.log_level, LogOutput::Stderr);
        let readiness = server::check(&*ctx, std::io::stdout()).await?;
        if !readiness.is_ready() {
            std::process::exit(1);
        }
        return Ok(());
    }

    sink.initialize(&config.log_level);
    info!(
        version = VERSION,
        qdrant = %config.qdrant_url,
        collection = %config.collection,
        timeout = ?config.probe_timeout,
        level = %sink.severity(),
        "starting vecready"
    );

    server::run(config.port, ctx).await
}

//! RateWatch binary
//!
//! Serves the EUR/RUB dashboard, or prints one snapshot as JSON.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ratewatch_dashboard::{router, DashboardConfig, Session};
use ratewatch_fx::{AggregatorConfig, RateAggregator};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RateWatch CLI
#[derive(Parser, Debug)]
#[command(name = "ratewatch")]
#[command(about = "EUR/RUB rate monitor and official rate forecast")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the dashboard (default)
    Serve {
        /// Port to listen on, overriding RATEWATCH_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Refresh once and print the report as JSON
    Snapshot {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut dashboard = DashboardConfig::from_env();

    init_logging(dashboard.log_json);

    let config = AggregatorConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid rate configuration");
        return Err(e).context("Configuration error");
    }
    let aggregator = RateAggregator::from_config(config).context("Failed to build sources")?;

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                dashboard.port = port;
            }
            serve(dashboard, aggregator).await
        }
        Command::Snapshot { pretty } => snapshot(aggregator, pretty).await,
    }
}

/// Plain or JSON log lines on stderr, filtered by `RUST_LOG`.
fn init_logging(json: bool) {
    let (plain, json) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(plain)
        .with(json)
        .init();
}

async fn serve(config: DashboardConfig, aggregator: RateAggregator) -> anyhow::Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;

    let session = Arc::new(Session::new(aggregator));
    let app = router(session);

    let listener = tokio::net::TcpListener::bind((config.listen_addr.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.listen_addr, config.port))?;

    info!(addr = %listener.local_addr()?, "RateWatch dashboard running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("RateWatch dashboard stopped");
    Ok(())
}

async fn snapshot(aggregator: RateAggregator, pretty: bool) -> anyhow::Result<()> {
    let report = aggregator.report(aggregator.refresh().await);
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use price_hunter::config::LoggingConfig;
use price_hunter::plugins::{AdbDeviceProbe, AutomationEngine, CommandEngine};
use price_hunter::web::{self, AppState};
use price_hunter::{AppConfig, TaskService};

#[derive(Parser, Debug)]
#[command(name = "price-hunter", version, about = "On-device price comparison and ordering")]
struct Cli {
    /// Directory holding default/{RUN_MODE}/local config files
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config_dir)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    let _guard = init_tracing(&config.logging)?;
    info!("Starting Price Hunter...");

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics.port))
            .install()?;
        info!("Metrics exporter listening on port {}", config.metrics.port);
    }

    let engine = Arc::new(CommandEngine::new(config.agent.clone()));
    info!("Automation engine: {} ({} search steps, {} order steps)",
        engine.name(), config.agent.search_max_steps, config.agent.order_max_steps);
    let probe = Arc::new(AdbDeviceProbe::new(config.device.clone()));
    let service = TaskService::new(&config, engine, probe);

    let state = AppState::new(service.clone(), config.clone());
    web::serve(config, state, shutdown_signal()).await?;

    info!("Shutting down...");
    service.shutdown().await;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive("price_hunter=debug".parse()?);

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
}

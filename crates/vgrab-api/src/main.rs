//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgrab_api::{create_router, metrics, ApiConfig, AppState, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();
    init_tracing(config.log_format)?;

    info!("Starting vgrab-api");
    info!(
        host = %config.host,
        port = config.port,
        temp_dir = %config.temp_dir.display(),
        max_duration_secs = config.max_duration_secs,
        allowed_hosts = ?config.allowed_hosts,
        "API config"
    );

    std::fs::create_dir_all(&config.temp_dir)
        .with_context(|| format!("Failed to create temp dir {}", config.temp_dir.display()))?;

    let state = AppState::new(config.clone());
    for tool in state.pipeline.backend().tool_status() {
        match tool.path {
            Some(path) => info!(tool = %tool.name, path = %path, "External tool found"),
            None => warn!(tool = %tool.name, "External tool not found, requests needing it will fail"),
        }
    }

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("vgrab=info,vgrab_api=info,vgrab_media=info,tower_http=info"))
        .context("Invalid log filter")?;

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?,
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

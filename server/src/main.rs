//! Seatbook HTTP server.
//!
//! Day-scoped seat reservations over JSON, backed by `PostgreSQL`.

use anyhow::Context;
use axum::{routing::get, Router};
use seatbook_core::SystemClock;
use seatbook_postgres::PostgresStore;
use seatbook_runtime::{metrics::PrometheusExporter, Stores};
use seatbook_server::{build_router, AppState, Config, PostgresProbe};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "seatbook=info,seatbook_server=info,seatbook_runtime=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(dotenv = dotenv.is_ok(), "Starting Seatbook server");

    let config = Config::from_env();
    info!(
        bind = %config.bind_addr(),
        metrics = %config.metrics_addr(),
        lead_time_minutes = config.allocation.lead_time_minutes,
        max_retries = config.allocation.max_retries,
        "Configuration loaded"
    );

    let exporter = PrometheusExporter::install().context("installing metrics recorder")?;

    info!("Connecting to database...");
    let store = Arc::new(
        PostgresStore::connect(&config.database.url, &config.pool_options())
            .await
            .context("connecting to PostgreSQL")?,
    );
    if config.database.run_migrations {
        store.migrate().await.context("running migrations")?;
        info!("Migrations applied");
    }

    let state = AppState::new(
        Stores::shared(Arc::clone(&store)),
        Arc::new(SystemClock),
        config.engine_config(),
        Arc::new(PostgresProbe(Arc::clone(&store))),
    );

    let metrics_listener = tokio::net::TcpListener::bind(config.metrics_addr())
        .await
        .context("binding metrics listener")?;
    let metrics_app = Router::new().route(
        "/metrics",
        get(move || {
            let exporter = exporter.clone();
            async move { exporter.render() }
        }),
    );
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            error!(error = %e, "Metrics server stopped");
        }
    });

    let app = build_router(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .context("binding API listener")?;
    info!(address = %config.bind_addr(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

use std::sync::Arc;

use ddb_server::metrics;
use ddb_server::query::Catalog;
use ddb_server::server::Server;
use ddb_server::Error;
use ddb_server::Result;
use ddb_server::ServerConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    // Setup failures are fatal: returning Err exits with a non-zero status.
    let settings = ServerConfig::new()?.validate()?;
    let executor = Arc::new(Catalog::from_config(&settings.catalog));
    info!("catalog loaded with {} records", executor.len());

    let server = Arc::new(Server::bind(settings.clone(), executor).inspect_err(|e| {
        error!("server setup failed: {}", e);
    })?);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(metrics::start_server(
            settings.monitoring.prometheus_port,
            graceful_rx.clone(),
        ));
    }

    let _acceptor = server.spawn_acceptor()?;
    info!("Application started. Waiting for CTRL+C signal...");

    wait_for_shutdown_signal().await?;
    if graceful_tx.send(()).is_err() {
        info!("metrics exporter already stopped");
    }

    // Blocks until every session has observed its forced close.
    let shutdown_server = server.clone();
    tokio::task::spawn_blocking(move || shutdown_server.shutdown())
        .await
        .map_err(|e| Error::Fatal(format!("shutdown task failed: {}", e)))?;

    info!("Exiting program.");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }
    Ok(())
}

fn init_observability() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();
}

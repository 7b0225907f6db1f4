use std::time::Duration;

use paranoia_worker::config::WorkerConfig;
use paranoia_worker::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paranoia_worker=debug,paranoia_producers=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(api_url = %config.api_url, "Loaded worker configuration");

    let http = reqwest::Client::builder()
        .build()
        .expect("Failed to build reqwest HTTP client");

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(&config, http);
    let handle = tokio::spawn(scheduler.run(cancel.clone()));

    shutdown_signal().await;
    cancel.cancel();

    if tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .is_err()
    {
        tracing::warn!("Scan scheduler did not stop in time");
    }
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

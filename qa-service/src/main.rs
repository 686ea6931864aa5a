//! Q&A service entry point.

use qa_service::config::QaConfig;
use qa_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;

/// Resolves on SIGINT or, on unix, SIGTERM (what container runtimes send).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await.ok();

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = QaConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting qa-service"
    );

    let app = Application::build(config)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to build application: {}", e)))?;

    tracing::info!(port = app.port(), "qa-service ready");

    app.run_until_stopped(shutdown_signal()).await
}

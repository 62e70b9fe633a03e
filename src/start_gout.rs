//! Startup helpers for the gout server.

use std::process::ExitCode;

use crate::config::AppConfig;
use crate::server::{self, AppState};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` refines the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Run the server until Ctrl+C (used by the `gout` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting gout v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = rt.block_on(async {
        let state = AppState::from_config(&config).await?;
        server::run_server_with_shutdown(state, config.server.port, shutdown_signal()).await
    });

    if let Err(e) = result {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

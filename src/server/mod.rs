//! HTTP server exposing event search and question answering.
//!
//! Provides REST endpoints for:
//! - Event search with an optional distance filter
//! - Hybrid retrieval over the ingested filings
//! - Question answering with source attribution

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Build the router with CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with graceful shutdown support.
///
/// The server will stop accepting new connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("gout server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

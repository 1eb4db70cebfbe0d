//! Web server — axum metrics endpoint.
//!
//! Handlers only read the [`MetricStore`]; they never trigger a fetch, so a
//! scrape is served from whatever the poll tasks last published.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use dump1090_core::MetricStore;

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub store: Arc<MetricStore>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(store: Arc<MetricStore>) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/", get(routes::index))
        .route("/metrics", get(routes::metrics))
        .with_state(state)
}

/// Serve `router` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "metrics endpoint listening on http://{addr}/metrics");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

//! Route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use dump1090_core::render::CONTENT_TYPE;

use crate::web::AppState;

const INDEX: &str = "dump1090 exporter\n\nMetrics are served at /metrics\n";

/// `GET /metrics`: exposition text for every stored sample.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.store.render() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /`
pub async fn index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], INDEX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

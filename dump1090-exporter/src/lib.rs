//! dump1090 exporter — polls dump1090 JSON resources and serves them as
//! Prometheus metrics.
//!
//! Three poll tasks (receiver, aircraft, stats) feed a shared
//! [`MetricStore`]; the axum router renders it on every scrape.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use dump1090_core::MetricStore;

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod poller;
pub mod web;

use config::ExporterConfig;
use error::ExporterError;
use poller::Poller;

/// Bind the configured address and run until `cancel` fires.
pub async fn run(config: ExporterConfig, cancel: CancellationToken) -> Result<(), ExporterError> {
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ExporterError::Bind { addr, source })?;
    run_with_listener(config, listener, cancel).await
}

/// Run the poll tasks and serve metrics on an already bound listener.
///
/// Returns once `cancel` has fired and the server and every poll task have
/// stopped.
pub async fn run_with_listener(
    config: ExporterConfig,
    listener: TcpListener,
    cancel: CancellationToken,
) -> Result<(), ExporterError> {
    let source = fetch::open_source(&config.resource, config.fetch_timeout)?;
    let store = Arc::new(MetricStore::new());

    tracing::info!(
        resource = %config.resource,
        timeout_secs = config.fetch_timeout.as_secs_f64(),
        "polling dump1090 resources"
    );

    let tasks = Poller::new(source, Arc::clone(&store), config.poller).start(cancel.clone());
    let served = web::serve(listener, web::build_router(store), cancel.clone()).await;

    // The server may also stop on its own error; take the pollers down with it.
    cancel.cancel();
    tasks.join().await;

    served.map_err(ExporterError::Serve)
}

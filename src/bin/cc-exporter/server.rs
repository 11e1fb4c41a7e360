use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Router, Server};
use config_collector::metric::render_gauge;
use config_collector::{Collector, Labels, Metadata};
use http::header;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Content type of the Prometheus text-exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub(crate) async fn start_web_server(listen_address: &SocketAddr, collector: Collector) -> Result<()> {
    let server = Server::try_bind(listen_address)
        .with_context(|| format!("failed to bind to {}", listen_address))?
        .serve(router(collector).into_make_service());

    debug!("Web server listening on {}", server.local_addr());
    info!("Metrics endpoint: http://{}/metrics", server.local_addr());

    server.await?;

    Ok(())
}

pub(crate) fn router(collector: Collector) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/metrics") }))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(collector))
}

/// Every scrape runs a full collection, prefixed by the build info gauge.
async fn metrics_handler(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    let metrics = collector.collect(&build_info_metric()).await;

    ([(header::CONTENT_TYPE, TEXT_FORMAT)], metrics)
}

pub(crate) fn build_info_metric() -> String {
    let metadata = Metadata {
        metric: "config_collector_build_info".to_string(),
        help: "A metric with a constant '1' value labeled by the version of the exporter."
            .to_string(),
        labels: Labels::from([(
            "version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]),
    };

    render_gauge(&metadata, true)
}

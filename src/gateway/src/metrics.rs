//! Metrics for the gateway daemon.

use anyhow::Result;
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_histogram, Counter, Histogram, HistogramOpts, Opts,
};
use std::net::SocketAddr;
use warp::Filter;

lazy_static! {
    /// Counter for transfers accepted by the node.
    pub static ref TRANSFER_COUNTER: Counter = register_counter!(
        Opts::new(
            "transfers_total",
            "Total number of transfers accepted by the node"
        )
    )
    .unwrap();

    /// Counter for transfers rejected or failed.
    pub static ref TRANSFER_FAILURE_COUNTER: Counter = register_counter!(
        Opts::new(
            "transfer_failures_total",
            "Total number of transfer submissions that failed"
        )
    )
    .unwrap();

    /// Counter for query requests served.
    pub static ref QUERY_COUNTER: Counter = register_counter!(
        Opts::new(
            "queries_total",
            "Total number of query requests served"
        )
    )
    .unwrap();

    /// Histogram for end-to-end transfer submission time.
    pub static ref TRANSFER_TIME: Histogram = register_histogram!(
        HistogramOpts::new(
            "transfer_submission_time_seconds",
            "Time from request receipt to broadcast response"
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    )
    .unwrap();
}

/// Registers all metrics.
pub fn register_metrics() {
    // Metrics are registered via lazy_static
}

/// Starts the metrics server.
pub async fn start_metrics_server(addr: SocketAddr) -> Result<()> {
    let metrics_route = warp::path("metrics").map(|| {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    });

    tokio::spawn(async move {
        warp::serve(metrics_route).run(addr).await;
    });

    Ok(())
}

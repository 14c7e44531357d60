//! HTTP gateway daemon for TON transfer submission and queries.

mod config;
mod metrics;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use config::GatewayConfig;
use metrics::register_metrics;
use routes::GatewayState;
use rpc::{LedgerQuery, LedgerRpc, NodeClient};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wallet::TransferService;

/// Command line arguments for the gateway daemon.
#[derive(Debug, StructOpt)]
#[structopt(name = "tongate", about = "TON transfer gateway")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Listen address for the HTTP server
    #[structopt(short, long)]
    listen: Option<String>,

    /// JSON-RPC endpoint of the ledger node
    #[structopt(short, long)]
    endpoint: Option<String>,

    /// Enable metrics server
    #[structopt(long)]
    metrics: bool,

    /// Metrics server address
    #[structopt(long, default_value = "127.0.0.1:9090")]
    metrics_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let opt = Opt::from_args();

    // Load configuration
    let mut config = match &opt.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env();
    if let Some(listen) = opt.listen {
        config.http.listen_addr = listen;
    }
    if let Some(endpoint) = opt.endpoint {
        config.node.endpoint = endpoint;
    }

    let timeout = Duration::from_secs(config.node.timeout_secs);
    let client = NodeClient::new(
        config.node.endpoint.clone(),
        config.node.api_key.clone(),
        timeout,
    )?;
    let rpc: Arc<dyn LedgerRpc> = Arc::new(client);

    let state = Arc::new(GatewayState {
        service: TransferService::new(rpc.clone()),
        query: LedgerQuery::new(rpc),
        timeout,
    });

    if opt.metrics || config.metrics.enabled {
        register_metrics();
        let metrics_addr: SocketAddr = if opt.metrics {
            opt.metrics_addr.parse()?
        } else {
            config.metrics.listen_addr.parse()?
        };
        metrics::start_metrics_server(metrics_addr).await?;
        info!("Metrics server listening on {}", metrics_addr);
    }

    let listen_addr: SocketAddr = config.http.listen_addr.parse()?;
    let routes = routes::routes(state, &config.http.cors_domains);

    info!("Gateway listening on {}", listen_addr);
    info!("Upstream node endpoint: {}", config.node.endpoint);
    warp::serve(routes).run(listen_addr).await;

    Ok(())
}

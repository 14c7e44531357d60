//! Configuration for the gateway daemon.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the gateway daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Upstream ledger node configuration
    pub node: NodeConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address for the HTTP server
    pub listen_addr: String,
    /// CORS allowed origins
    pub cors_domains: Vec<String>,
}

/// Upstream ledger node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint of the ledger node
    pub endpoint: String,
    /// API key attached to each upstream call
    pub api_key: Option<String>,
    /// Deadline in seconds for each submission and query
    pub timeout_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether to enable the metrics server
    pub enabled: bool,
    /// Listen address for the metrics server
    pub listen_addr: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                listen_addr: "127.0.0.1:3000".to_string(),
                cors_domains: vec!["*".to_string()],
            },
            node: NodeConfig {
                endpoint: "https://testnet.toncenter.com/api/v2/jsonRPC".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            metrics: MetricsConfig {
                enabled: false,
                listen_addr: "127.0.0.1:9090".to_string(),
            },
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Applies environment overrides for credentials.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("TON_API_KEY") {
            if !key.is_empty() {
                self.node.api_key = Some(key);
            }
        }
        if let Ok(endpoint) = std::env::var("TON_ENDPOINT") {
            if !endpoint.is_empty() {
                self.node.endpoint = endpoint;
            }
        }
    }
}

//! Error types for the RPC crate.

use thiserror::Error;

/// Errors that can occur when talking to the ledger node.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Error when the node cannot be reached.
    #[error("Node unreachable: {0}")]
    Network(String),

    /// Error when a call to the node exceeds its deadline.
    #[error("Node request timed out: {0}")]
    Timeout(String),

    /// Error when the node's response cannot be parsed.
    #[error("Malformed node response: {0}")]
    InvalidResponse(String),

    /// Error the node itself reported for a call.
    #[error("Node returned an error: {0}")]
    Node(String),

    /// Error when the node rejected a broadcast payload.
    #[error("Broadcast rejected: {0}")]
    Rejected(String),

    /// Error when a query produced no results.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RpcError::Timeout(error.to_string())
        } else {
            RpcError::Network(error.to_string())
        }
    }
}

//! Error types for the wallet crate.

use cells::{AddressError, EncodingError};
use rpc::RpcError;
use thiserror::Error;

/// Errors that can occur in the transfer pipeline.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Error when the supplied key material is not valid.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// Error when an address fails validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Error when an amount is out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Error for the token-transfer path, which is deliberately not
    /// implemented.
    #[error("Token transfers are not supported")]
    Unsupported,

    /// Error when the node cannot be reached or answers garbage.
    #[error("Network error: {0}")]
    Network(String),

    /// Error when the transaction cannot be encoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Error when the node rejected the broadcast.
    #[error("Broadcast rejected by node: {0}")]
    BroadcastRejected(String),

    /// Error when the request's deadline elapsed.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl From<AddressError> for WalletError {
    fn from(error: AddressError) -> Self {
        WalletError::InvalidAddress(error.to_string())
    }
}

impl From<RpcError> for WalletError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Rejected(message) => WalletError::BroadcastRejected(message),
            other => WalletError::Network(other.to_string()),
        }
    }
}

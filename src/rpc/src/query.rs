//! Read-only ledger queries.

use crate::client::LedgerRpc;
use crate::errors::RpcError;
use cells::Address;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Fixed page size for account-history lookups. Cursor-based continuation
/// past the first page is a deliberate extension point, not implemented.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// Read-only wrapper over the node's query surface.
pub struct LedgerQuery {
    rpc: Arc<dyn LedgerRpc>,
}

impl LedgerQuery {
    /// Creates a query client over the given RPC transport.
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Looks up a transaction by hash. An empty result is
    /// [`RpcError::NotFound`], never an empty success.
    pub async fn transaction(&self, hash: &str) -> Result<Value, RpcError> {
        let mut transactions = self.rpc.transactions_by_hash(hash).await?;
        if transactions.is_empty() {
            return Err(RpcError::NotFound(format!(
                "no transaction found for hash {hash}"
            )));
        }
        Ok(transactions.swap_remove(0))
    }

    /// Returns up to [`HISTORY_PAGE_SIZE`] transactions of an account,
    /// newest first. An empty page is [`RpcError::NotFound`].
    pub async fn account_history(&self, address: &Address) -> Result<Vec<Value>, RpcError> {
        let transactions = self
            .rpc
            .account_transactions(address, HISTORY_PAGE_SIZE)
            .await?;
        if transactions.is_empty() {
            return Err(RpcError::NotFound(format!(
                "no transactions found for wallet {address}"
            )));
        }
        debug!(%address, count = transactions.len(), "account history fetched");
        Ok(transactions)
    }
}

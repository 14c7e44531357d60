//! Broadcast of an encoded message to the node.

use std::sync::Arc;

use rpc::LedgerRpc;
use serde_json::Value;
use tracing::info;

use crate::errors::WalletError;

/// Node response for an accepted broadcast.
///
/// Acceptance means the node took the message into its mempool; it does
/// not mean the transfer was executed on chain. Callers who need finality
/// must poll the account's transaction history.
#[derive(Debug, Clone)]
pub struct BroadcastResult {
    pub response: Value,
}

/// Submits an encoded bag of cells to the node.
///
/// There is no automatic retry here: resubmitting without re-reading the
/// account seqno risks a duplicate transfer, so a failed broadcast is
/// surfaced to the caller instead.
pub async fn broadcast(
    rpc: &Arc<dyn LedgerRpc>,
    encoded: &[u8],
) -> Result<BroadcastResult, WalletError> {
    let response = rpc.send_boc(encoded).await?;
    info!(size = encoded.len(), "broadcast accepted by node");
    Ok(BroadcastResult { response })
}

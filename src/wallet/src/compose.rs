//! Transfer message composition and fee estimation.

use std::sync::Arc;

use cells::{boc, Address, Cell, CellBuilder};
use rpc::{FeeEstimate, LedgerRpc};
use tracing::warn;

use crate::errors::WalletError;
use crate::session::WalletSession;

/// Opcode of a plain transfer with an empty comment.
pub const TRANSFER_OPCODE: u32 = 0;

/// A composed transfer body plus the seqno it was built against and the
/// fee estimate the node returned for it, if any.
#[derive(Debug, Clone)]
pub struct TransferMessage {
    pub body: Cell,
    pub seqno: u64,
    pub fee: Option<FeeEstimate>,
}

/// Builds the transfer body cell and asks the node to price it.
///
/// Fee estimation is advisory: if the node cannot price the message the
/// transfer still proceeds with `fee: None` rather than aborting.
pub async fn compose_transfer(
    rpc: &Arc<dyn LedgerRpc>,
    session: &WalletSession,
    to: &Address,
    amount: u128,
) -> Result<TransferMessage, WalletError> {
    let mut builder = CellBuilder::new();
    builder.write_uint(TRANSFER_OPCODE as u128, 32)?;
    builder.write_address(to)?;
    builder.write_coins(amount)?;
    let body = builder.build();

    let encoded = boc::serialize(&body)?;
    let fee = match rpc.estimate_fee(&session.address, &encoded, session.seqno).await {
        Ok(estimate) => Some(estimate),
        Err(e) => {
            warn!(address = %session.address, error = %e, "fee estimation failed, continuing without estimate");
            None
        }
    };

    Ok(TransferMessage {
        body,
        seqno: session.seqno,
        fee,
    })
}

//! Transfer orchestration with per-account serialization.

use std::sync::Arc;

use cells::{boc, Address};
use dashmap::DashMap;
use rpc::{FeeEstimate, LedgerRpc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::broadcast::broadcast;
use crate::compose::compose_transfer;
use crate::errors::WalletError;
use crate::session::{WalletKey, WalletSession};

/// Parameters of a transfer submission.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub to: String,
    pub amount: u128,
}

/// Outcome of an accepted transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub encoded: Vec<u8>,
    pub seqno: u64,
    pub fee: Option<FeeEstimate>,
    pub response: Value,
}

/// Coordinates the seqno-read / compose / broadcast pipeline.
///
/// Submissions for the same account run strictly one at a time: the lock
/// is held from the seqno read until the broadcast returns, so two
/// concurrent transfers from one wallet cannot race on the same seqno.
/// Different accounts proceed in parallel.
pub struct TransferService {
    rpc: Arc<dyn LedgerRpc>,
    locks: DashMap<Address, Arc<Mutex<()>>>,
}

impl TransferService {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        TransferService {
            rpc,
            locks: DashMap::new(),
        }
    }

    fn account_lock(&self, address: &Address) -> Arc<Mutex<()>> {
        self.locks
            .entry(*address)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of accounts with a live lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    /// Runs a full transfer for the given wallet key.
    pub async fn send_transfer(
        &self,
        key_b64: &str,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, WalletError> {
        let key = WalletKey::parse(key_b64)?;
        let to: Address = request.to.parse()?;

        let lock = self.account_lock(&key.address);
        let result = {
            let _guard = lock.lock().await;
            self.submit(&key, &to, request.amount).await
        };
        drop(lock);
        // Addresses come from caller-supplied keys, so the table must not
        // grow without bound: drop the entry once no submission holds it.
        self.locks
            .remove_if(&key.address, |_, entry| Arc::strong_count(entry) == 1);
        result
    }

    async fn submit(
        &self,
        key: &WalletKey,
        to: &Address,
        amount: u128,
    ) -> Result<TransferReceipt, WalletError> {
        let session = WalletSession::open(&self.rpc, key).await?;
        let message = compose_transfer(&self.rpc, &session, to, amount).await?;
        let encoded = boc::serialize(&message.body)?;
        let result = broadcast(&self.rpc, &encoded).await?;

        info!(
            from = %session.address,
            to = %to,
            amount,
            seqno = message.seqno,
            "transfer submitted"
        );

        Ok(TransferReceipt {
            encoded,
            seqno: message.seqno,
            fee: message.fee,
            response: result.response,
        })
    }

    /// Token transfers are not implemented by this gateway.
    pub async fn send_token(
        &self,
        _key_b64: &str,
        _request: &TransferRequest,
        _token_address: &str,
    ) -> Result<TransferReceipt, WalletError> {
        Err(WalletError::Unsupported)
    }
}

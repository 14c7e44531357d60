//! Scripted in-memory ledger node used across the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cells::Address;
use ed25519_dalek::{PublicKey, SecretKey};
use rpc::{FeeEstimate, LedgerRpc, RpcError};
use serde_json::{json, Value};

/// In-memory node that enforces seqno monotonicity per account.
///
/// `estimate_fee` records the seqno the gateway composed against and marks
/// it as the pending seqno of the submission in flight. `send_boc` commits
/// that pending seqno: it is accepted only if it matches the account's
/// current seqno, which then advances by one. Interleaving two submissions
/// for the same account therefore gets the second one rejected, exactly
/// as a real node does on a stale seqno.
#[derive(Default)]
pub struct MockNode {
    seqnos: Mutex<HashMap<Address, u64>>,
    pending: Mutex<Option<(Address, u64)>>,
    pub fee_calls: Mutex<Vec<(Address, u64)>>,
    pub broadcasts: Mutex<Vec<Vec<u8>>>,
    pub transactions: Mutex<HashMap<String, Value>>,
    pub history: Mutex<HashMap<Address, Vec<Value>>>,
    pub fail_fee: AtomicBool,
    pub reject_broadcast: AtomicBool,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account at the given seqno.
    pub fn set_seqno(&self, address: Address, seqno: u64) {
        self.seqnos.lock().unwrap().insert(address, seqno);
    }

    pub fn add_transaction(&self, hash: &str, body: Value) {
        self.transactions.lock().unwrap().insert(hash.to_string(), body);
    }

    pub fn add_history(&self, address: Address, entries: Vec<Value>) {
        self.history.lock().unwrap().insert(address, entries);
    }

    pub fn fee_seqnos(&self) -> Vec<u64> {
        self.fee_calls.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }
}

#[async_trait]
impl LedgerRpc for MockNode {
    async fn seqno(&self, address: &Address) -> Result<u64, RpcError> {
        Ok(*self.seqnos.lock().unwrap().get(address).unwrap_or(&0))
    }

    async fn estimate_fee(
        &self,
        address: &Address,
        _body: &[u8],
        seqno: u64,
    ) -> Result<FeeEstimate, RpcError> {
        if self.fail_fee.load(Ordering::SeqCst) {
            return Err(RpcError::Node("cannot estimate fee".to_string()));
        }
        self.fee_calls.lock().unwrap().push((*address, seqno));
        *self.pending.lock().unwrap() = Some((*address, seqno));
        Ok(FeeEstimate {
            in_fwd_fee: 100,
            storage_fee: 10,
            gas_fee: 1000,
            fwd_fee: 50,
        })
    }

    async fn send_boc(&self, boc: &[u8]) -> Result<Value, RpcError> {
        if self.reject_broadcast.load(Ordering::SeqCst) {
            return Err(RpcError::Rejected("message not accepted".to_string()));
        }
        if let Some((address, seqno)) = self.pending.lock().unwrap().take() {
            let mut seqnos = self.seqnos.lock().unwrap();
            let current = seqnos.entry(address).or_insert(0);
            if seqno != *current {
                return Err(RpcError::Rejected(format!(
                    "stale seqno {seqno}, expected {current}"
                )));
            }
            *current += 1;
        }
        self.broadcasts.lock().unwrap().push(boc.to_vec());
        Ok(json!({ "@type": "ok" }))
    }

    async fn transactions_by_hash(&self, hash: &str) -> Result<Vec<Value>, RpcError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn account_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<Value>, RpcError> {
        let history = self.history.lock().unwrap();
        let entries = history.get(address).cloned().unwrap_or_default();
        Ok(entries.into_iter().take(limit).collect())
    }
}

/// Deterministic valid wallet key for tests, as the base64 the API accepts.
pub fn test_key_b64(seed: u8) -> String {
    let secret = SecretKey::from_bytes(&[seed; 32]).unwrap();
    let public = PublicKey::from(&secret);
    BASE64.encode(public.as_bytes())
}

/// Address the gateway derives for [`test_key_b64`] with the same seed.
pub fn test_key_address(seed: u8) -> Address {
    wallet::WalletKey::parse(&test_key_b64(seed)).unwrap().address
}

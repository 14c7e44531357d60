//! JSON-RPC client for the ledger node.

use crate::errors::RpcError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cells::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Fee breakdown returned by the node's dry-run estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeEstimate {
    /// Fee for importing the external message
    pub in_fwd_fee: u64,
    /// Storage fee charged to the account
    pub storage_fee: u64,
    /// Gas fee of the compute phase
    pub gas_fee: u64,
    /// Forwarding fee of the outbound message
    pub fwd_fee: u64,
}

impl FeeEstimate {
    /// Sum of all fee components, saturating: the values come from the
    /// node and must not be able to panic the gateway.
    pub fn total(&self) -> u64 {
        self.in_fwd_fee
            .saturating_add(self.storage_fee)
            .saturating_add(self.gas_fee)
            .saturating_add(self.fwd_fee)
    }
}

/// The node RPC surface the gateway consumes. Implemented by [`NodeClient`]
/// over HTTPS and by scripted mocks in tests.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Current sequence number of the account. Returns 0 for an account
    /// with no history; that is a valid, uninitialized account, not an
    /// error.
    async fn seqno(&self, address: &Address) -> Result<u64, RpcError>;

    /// Dry-run fee estimate for a transfer body at the given seqno.
    async fn estimate_fee(
        &self,
        address: &Address,
        body: &[u8],
        seqno: u64,
    ) -> Result<FeeEstimate, RpcError>;

    /// Submits an encoded transaction. Rejection by the node surfaces as
    /// [`RpcError::Rejected`].
    async fn send_boc(&self, boc: &[u8]) -> Result<Value, RpcError>;

    /// Looks up transactions by hash.
    async fn transactions_by_hash(&self, hash: &str) -> Result<Vec<Value>, RpcError>;

    /// Most recent transactions of an account, newest first.
    async fn account_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<Value>, RpcError>;
}

/// reqwest-backed JSON-RPC client. One instance is built at startup and
/// shared; every call attaches the API key header and is bounded by the
/// configured per-request timeout.
pub struct NodeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl NodeClient {
    /// Creates a client for the given JSON-RPC endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut request = self.http.post(&self.endpoint).json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        }));
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.get("error") {
            if !error.is_null() {
                return Err(RpcError::Node(error.to_string()));
            }
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| RpcError::InvalidResponse("no result in response".to_string()))
    }
}

#[async_trait]
impl LedgerRpc for NodeClient {
    async fn seqno(&self, address: &Address) -> Result<u64, RpcError> {
        let result = match self
            .call(
                "runGetMethod",
                json!({
                    "address": address.to_string(),
                    "method": "seqno",
                    "stack": [],
                }),
            )
            .await
        {
            Ok(result) => result,
            // An undeployed contract has no seqno method to run; its
            // sequence number is 0. Any other node-reported fault (bad
            // API key, rate limit, internal error) must surface.
            Err(RpcError::Node(message)) if is_uninitialized_error(&message) => {
                debug!(%address, %message, "seqno lookup on uninitialized account");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        parse_seqno_result(&result)
    }

    async fn estimate_fee(
        &self,
        address: &Address,
        body: &[u8],
        seqno: u64,
    ) -> Result<FeeEstimate, RpcError> {
        let result = self
            .call(
                "estimateFee",
                json!({
                    "address": address.to_string(),
                    "body": BASE64.encode(body),
                    "seqno": seqno,
                    "ignore_chksig": true,
                }),
            )
            .await?;
        parse_fee_result(&result)
    }

    async fn send_boc(&self, boc: &[u8]) -> Result<Value, RpcError> {
        match self
            .call("sendBoc", json!({ "boc": BASE64.encode(boc) }))
            .await
        {
            Ok(result) => Ok(result),
            Err(RpcError::Node(message)) => Err(RpcError::Rejected(message)),
            Err(e) => Err(e),
        }
    }

    async fn transactions_by_hash(&self, hash: &str) -> Result<Vec<Value>, RpcError> {
        let result = self
            .call("getTransactions", json!({ "hash": hash, "limit": 1 }))
            .await?;
        parse_transaction_list(&result)
    }

    async fn account_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<Value>, RpcError> {
        let result = self
            .call(
                "getTransactions",
                json!({ "address": address.to_string(), "limit": limit }),
            )
            .await?;
        parse_transaction_list(&result)
    }
}

/// Whether a node error from `runGetMethod` means the account has no
/// deployed contract, as opposed to a fault on the node's side.
fn is_uninitialized_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("not active")
        || message.contains("not initialized")
        || message.contains("uninitialized")
}

/// Extracts the sequence number from a `runGetMethod` result. A non-zero
/// exit code means the get method did not run, which for a wallet contract
/// means the account is uninitialized: seqno 0.
fn parse_seqno_result(result: &Value) -> Result<u64, RpcError> {
    let exit_code = result
        .get("exit_code")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if exit_code != 0 {
        return Ok(0);
    }

    let stack = result
        .get("stack")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::InvalidResponse("no stack in get-method result".to_string()))?;
    let top = match stack.first() {
        Some(top) => top,
        None => return Ok(0),
    };
    // Stack entries are ["num", "0x..."] pairs.
    let text = top
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidResponse(format!("bad stack entry: {top}")))?;
    let digits = text.trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad seqno `{text}`: {e}")))
}

/// Extracts the fee breakdown from an `estimateFee` result. At least one
/// known fee field must be present; defaulting an unrelated object to an
/// all-zero estimate would hide a malformed response.
fn parse_fee_result(result: &Value) -> Result<FeeEstimate, RpcError> {
    let fees = result.get("source_fees").unwrap_or(result);
    let known = ["in_fwd_fee", "storage_fee", "gas_fee", "fwd_fee"];
    if !known.iter().any(|field| fees.get(field).is_some()) {
        return Err(RpcError::InvalidResponse(format!(
            "no fee fields in estimate: {fees}"
        )));
    }
    serde_json::from_value(fees.clone())
        .map_err(|e| RpcError::InvalidResponse(format!("bad fee estimate: {e}")))
}

/// Extracts the transaction array from a `getTransactions` result.
fn parse_transaction_list(result: &Value) -> Result<Vec<Value>, RpcError> {
    match result {
        Value::Array(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(RpcError::InvalidResponse(format!(
            "expected a transaction list, got {other}"
        ))),
    }
}

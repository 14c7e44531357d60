//! HTTP routes for transfer submission and ledger queries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cells::Address;
use rpc::{LedgerQuery, RpcError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use wallet::{TransferRequest, TransferService, WalletError};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::metrics::{QUERY_COUNTER, TRANSFER_COUNTER, TRANSFER_FAILURE_COUNTER, TRANSFER_TIME};

/// Shared state for the HTTP handlers.
pub struct GatewayState {
    /// Transfer pipeline with per-account serialization
    pub service: TransferService,
    /// Read-only ledger queries
    pub query: LedgerQuery,
    /// Deadline applied to each transfer submission
    pub timeout: Duration,
}

/// Body of a transfer submission.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub to: String,
    pub amount: u64,
    /// Base64 wallet key. Named for API compatibility; carries the public
    /// key bytes used for address derivation, never a signing key.
    pub private_key: String,
}

// The key field never appears in logs or error output.
impl fmt::Debug for SendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendRequest")
            .field("to", &self.to)
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

/// Body of a token transfer submission.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTokenRequest {
    pub to: String,
    pub amount: u64,
    pub token_address: String,
    pub private_key: String,
}

impl fmt::Debug for SendTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendTokenRequest")
            .field("to", &self.to)
            .field("amount", &self.amount)
            .field("token_address", &self.token_address)
            .finish_non_exhaustive()
    }
}

/// Builds the full route tree.
pub fn routes(
    state: Arc<GatewayState>,
    cors_domains: &[String],
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let send = warp::path!("send-transaction")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_send);

    let send_token = warp::path!("send-token")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_send_token);

    let transaction = warp::path!("transaction" / String)
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(handle_transaction);

    let history = warp::path!("wallet" / String / "transactions")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_history);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    let mut cors = warp::cors()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);
    if cors_domains.iter().any(|d| d == "*") {
        cors = cors.allow_any_origin();
    } else {
        for domain in cors_domains {
            cors = cors.allow_origin(domain.as_str());
        }
    }

    send.or(send_token)
        .or(transaction)
        .or(history)
        .or(health)
        .with(cors)
}

/// Provides the gateway state to handlers.
fn with_state(
    state: Arc<GatewayState>,
) -> impl Filter<Extract = (Arc<GatewayState>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Handles `POST /send-transaction`.
async fn handle_send(
    request: SendRequest,
    state: Arc<GatewayState>,
) -> Result<impl Reply, Rejection> {
    let timer = TRANSFER_TIME.start_timer();
    debug!(request = ?request, "transfer submission received");

    let transfer = TransferRequest {
        to: request.to.clone(),
        amount: request.amount as u128,
    };

    let outcome = match tokio::time::timeout(
        state.timeout,
        state.service.send_transfer(&request.private_key, &transfer),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(WalletError::DeadlineExceeded),
    };
    timer.observe_duration();

    match outcome {
        Ok(receipt) => {
            TRANSFER_COUNTER.inc();
            let body = json!({
                "success": true,
                "message": "Transaction sent successfully",
                "log": BASE64.encode(&receipt.encoded),
                "seqno": receipt.seqno,
                "fee": receipt.fee,
            });
            Ok(warp::reply::with_status(
                warp::reply::json(&body),
                StatusCode::OK,
            ))
        }
        Err(e) => {
            TRANSFER_FAILURE_COUNTER.inc();
            warn!(error = %e, "transfer submission failed");
            Ok(error_reply(wallet_status(&e), &e.to_string()))
        }
    }
}

/// Handles `POST /send-token`. The token path is intentionally unsupported.
async fn handle_send_token(
    request: SendTokenRequest,
    _state: Arc<GatewayState>,
) -> Result<impl Reply, Rejection> {
    debug!(request = ?request, "token transfer rejected as unsupported");
    Ok(error_reply(
        StatusCode::NOT_IMPLEMENTED,
        &WalletError::Unsupported.to_string(),
    ))
}

/// Handles `POST /transaction/:hash`.
async fn handle_transaction(
    hash: String,
    state: Arc<GatewayState>,
) -> Result<impl Reply, Rejection> {
    QUERY_COUNTER.inc();
    match state.query.transaction(&hash).await {
        Ok(data) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "success": true, "data": data })),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(rpc_status(&e), &e.to_string())),
    }
}

/// Handles `GET /wallet/:address/transactions`.
async fn handle_history(
    address: String,
    state: Arc<GatewayState>,
) -> Result<impl Reply, Rejection> {
    QUERY_COUNTER.inc();
    let address: Address = match address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                &format!("invalid address: {e}"),
            ))
        }
    };

    match state.query.account_history(&address).await {
        Ok(data) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "success": true, "data": data })),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(rpc_status(&e), &e.to_string())),
    }
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({ "success": false, "message": message })),
        status,
    )
}

/// Maps transfer pipeline errors to response status codes.
fn wallet_status(error: &WalletError) -> StatusCode {
    match error {
        WalletError::InvalidKey(_)
        | WalletError::InvalidAddress(_)
        | WalletError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        WalletError::Unsupported => StatusCode::NOT_IMPLEMENTED,
        WalletError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WalletError::Network(_)
        | WalletError::BroadcastRejected(_)
        | WalletError::DeadlineExceeded => StatusCode::BAD_GATEWAY,
    }
}

/// Maps query errors to response status codes.
fn rpc_status(error: &RpcError) -> StatusCode {
    match error {
        RpcError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

//! Tests for the node RPC client against a stub HTTP server.

use std::net::SocketAddr;
use std::time::Duration;

use cells::Address;
use rpc::{LedgerRpc, NodeClient, RpcError};
use serde_json::{json, Value};
use warp::Filter;

/// Serves a fixed JSON-RPC envelope on an ephemeral port.
fn stub_node(envelope: Value) -> SocketAddr {
    let route = warp::post().map(move || warp::reply::json(&envelope));
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn client_for(addr: SocketAddr) -> NodeClient {
    NodeClient::new(format!("http://{addr}"), None, Duration::from_secs(5)).unwrap()
}

fn account() -> Address {
    Address {
        workchain: 0,
        hash: [0x21; 32],
    }
}

/// A node-side fault during seqno lookup surfaces as an error, never as a
/// healthy seqno-0 account.
#[tokio::test]
async fn test_seqno_propagates_node_faults() {
    let addr = stub_node(json!({
        "ok": false,
        "error": "API key is invalid",
        "code": 401,
    }));
    let client = client_for(addr);

    let result = client.seqno(&account()).await;
    assert!(matches!(result, Err(RpcError::Node(_))), "got {result:?}");
}

/// An inactive-contract error from the node still reads as seqno 0.
#[tokio::test]
async fn test_seqno_zero_for_inactive_contract() {
    let addr = stub_node(json!({
        "ok": false,
        "error": "Contract is not active",
    }));
    let client = client_for(addr);

    assert_eq!(client.seqno(&account()).await.unwrap(), 0);
}

/// A healthy get-method result parses through to the stack value.
#[tokio::test]
async fn test_seqno_from_get_method_result() {
    let addr = stub_node(json!({
        "ok": true,
        "result": {
            "exit_code": 0,
            "stack": [["num", "0x2a"]],
        },
    }));
    let client = client_for(addr);

    assert_eq!(client.seqno(&account()).await.unwrap(), 42);
}

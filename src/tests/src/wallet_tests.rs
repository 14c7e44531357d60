//! Tests for the wallet crate's transfer pipeline.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cells::Address;
use rpc::LedgerRpc;
use wallet::{TransferRequest, TransferService, WalletError};

use crate::mock::{test_key_address, test_key_b64, MockNode};

fn destination() -> String {
    Address {
        workchain: 0,
        hash: [0x55; 32],
    }
    .to_string()
}

/// An account with no history opens at seqno 0 and can still submit.
#[tokio::test]
async fn test_uninitialized_account_submits() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let receipt = service
        .send_transfer(
            &test_key_b64(1),
            &TransferRequest {
                to: destination(),
                amount: 1_000,
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.seqno, 0);
    assert!(receipt.fee.is_some());
    assert_eq!(node.broadcasts.lock().unwrap().len(), 1);
}

/// Fee estimation failure is carried as an absent estimate, not an abort.
#[tokio::test]
async fn test_fee_failure_does_not_abort() {
    let node = Arc::new(MockNode::new());
    node.fail_fee.store(true, Ordering::SeqCst);
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let receipt = service
        .send_transfer(
            &test_key_b64(1),
            &TransferRequest {
                to: destination(),
                amount: 500,
            },
        )
        .await
        .unwrap();

    assert!(receipt.fee.is_none());
    assert_eq!(node.broadcasts.lock().unwrap().len(), 1);
}

/// Node-side rejection surfaces as a broadcast error.
#[tokio::test]
async fn test_broadcast_rejection() {
    let node = Arc::new(MockNode::new());
    node.reject_broadcast.store(true, Ordering::SeqCst);
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let result = service
        .send_transfer(
            &test_key_b64(1),
            &TransferRequest {
                to: destination(),
                amount: 500,
            },
        )
        .await;

    assert!(matches!(result, Err(WalletError::BroadcastRejected(_))));
}

/// Invalid inputs fail before any RPC call is made.
#[tokio::test]
async fn test_validation_before_network() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let bad_key = service
        .send_transfer(
            "!!not base64!!",
            &TransferRequest {
                to: destination(),
                amount: 1,
            },
        )
        .await;
    assert!(matches!(bad_key, Err(WalletError::InvalidKey(_))));

    let bad_address = service
        .send_transfer(
            &test_key_b64(1),
            &TransferRequest {
                to: "not an address".to_string(),
                amount: 1,
            },
        )
        .await;
    assert!(matches!(bad_address, Err(WalletError::InvalidAddress(_))));

    assert!(node.broadcasts.lock().unwrap().is_empty());
}

/// Zero is a legal amount: it composes, encodes as the lone zero nibble
/// and broadcasts like any other transfer.
#[tokio::test]
async fn test_zero_amount_transfer() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let receipt = service
        .send_transfer(
            &test_key_b64(1),
            &TransferRequest {
                to: destination(),
                amount: 0,
            },
        )
        .await
        .unwrap();

    let decoded = cells::boc::deserialize(&receipt.encoded).unwrap();
    let mut slice = decoded.parse();
    slice.load_uint(32).unwrap();
    slice.load_address().unwrap();
    assert_eq!(slice.load_coins().unwrap(), 0);
    assert_eq!(slice.remaining_bits(), 0);
    assert_eq!(node.broadcasts.lock().unwrap().len(), 1);
}

/// The token path is an explicit unsupported result.
#[tokio::test]
async fn test_token_transfer_unsupported() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let result = service
        .send_token(
            &test_key_b64(1),
            &TransferRequest {
                to: destination(),
                amount: 1,
            },
            "0:0000000000000000000000000000000000000000000000000000000000000001",
        )
        .await;

    assert!(matches!(result, Err(WalletError::Unsupported)));
}

/// Without serialization, interleaved submissions from one account race on
/// the seqno and the node rejects the second broadcast.
#[tokio::test]
async fn test_unserialized_submissions_race() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let address = test_key_address(1);
    node.set_seqno(address, 5);

    // Both read seqno 5 before either broadcasts.
    let first_seqno = rpc.seqno(&address).await.unwrap();
    let second_seqno = rpc.seqno(&address).await.unwrap();
    assert_eq!(first_seqno, 5);
    assert_eq!(second_seqno, 5);

    rpc.estimate_fee(&address, &[], first_seqno).await.unwrap();
    rpc.send_boc(&[1]).await.unwrap();

    rpc.estimate_fee(&address, &[], second_seqno).await.unwrap();
    let second = rpc.send_boc(&[2]).await;
    assert!(matches!(second, Err(rpc::RpcError::Rejected(_))));
}

/// With per-account serialization, concurrent submissions from one wallet
/// both land, using consecutive seqnos.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_serialized() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = Arc::new(TransferService::new(rpc));
    node.set_seqno(test_key_address(1), 5);

    let request = TransferRequest {
        to: destination(),
        amount: 250,
    };

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = service.clone();
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            service.send_transfer(&test_key_b64(1), &request).await
        }));
    }

    let mut seqnos = Vec::new();
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        seqnos.push(receipt.seqno);
    }
    seqnos.sort_unstable();
    assert_eq!(seqnos, vec![5, 6]);
    assert_eq!(node.fee_seqnos(), vec![5, 6]);
    assert_eq!(node.broadcasts.lock().unwrap().len(), 2);
    assert_eq!(service.active_locks(), 0);
}

/// Lock entries do not accumulate across submissions: once a wallet's
/// transfer finishes its entry is dropped from the table.
#[tokio::test]
async fn test_lock_table_does_not_grow() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    for seed in 1u8..=5 {
        service
            .send_transfer(
                &test_key_b64(seed),
                &TransferRequest {
                    to: destination(),
                    amount: 10,
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(service.active_locks(), 0);
}

/// Submissions from different wallets do not block each other.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_accounts_independent() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = Arc::new(TransferService::new(rpc));

    let mut handles = Vec::new();
    for seed in [1u8, 2] {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .send_transfer(
                    &test_key_b64(seed),
                    &TransferRequest {
                        to: destination(),
                        amount: 100,
                    },
                )
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(node.broadcasts.lock().unwrap().len(), 2);
}

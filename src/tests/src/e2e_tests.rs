//! End-to-end submission flow against the scripted node.

use std::sync::Arc;

use cells::{boc, Address};
use rpc::LedgerRpc;
use wallet::{TransferRequest, TransferService};

use crate::mock::{test_key_address, test_key_b64, MockNode};

/// Full pipeline: seqno 5 is used for the fee estimate, the encoder emits
/// a single cell within capacity, and the broadcast carries exactly the
/// bytes the encoder produced.
#[tokio::test]
async fn test_full_submission_flow() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    let sender = test_key_address(3);
    node.set_seqno(sender, 5);

    let destination = Address {
        workchain: 0,
        hash: [0xAB; 32],
    };
    let receipt = service
        .send_transfer(
            &test_key_b64(3),
            &TransferRequest {
                to: destination.to_base64(true),
                amount: 1_000_000_000,
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.seqno, 5);
    assert_eq!(node.fee_seqnos(), vec![5]);

    // The node received exactly what the encoder produced.
    let broadcasts = node.broadcasts.lock().unwrap();
    assert_eq!(broadcasts.as_slice(), &[receipt.encoded.clone()]);

    // A plain transfer fits one cell.
    let decoded = boc::deserialize(&receipt.encoded).unwrap();
    assert!(decoded.refs().is_empty());
    assert!(decoded.bit_len() <= 1023);

    let mut slice = decoded.parse();
    assert_eq!(slice.load_uint(32).unwrap(), 0);
    assert_eq!(slice.load_address().unwrap(), destination);
    assert_eq!(slice.load_coins().unwrap(), 1_000_000_000);
}

/// A second transfer from the same wallet picks up the advanced seqno.
#[tokio::test]
async fn test_sequential_transfers_advance_seqno() {
    let node = Arc::new(MockNode::new());
    let rpc: Arc<dyn LedgerRpc> = node.clone();
    let service = TransferService::new(rpc);

    node.set_seqno(test_key_address(4), 9);
    let request = TransferRequest {
        to: Address {
            workchain: 0,
            hash: [0x01; 32],
        }
        .to_string(),
        amount: 42,
    };

    let first = service.send_transfer(&test_key_b64(4), &request).await.unwrap();
    let second = service.send_transfer(&test_key_b64(4), &request).await.unwrap();

    assert_eq!(first.seqno, 9);
    assert_eq!(second.seqno, 10);
    assert_eq!(node.fee_seqnos(), vec![9, 10]);
}

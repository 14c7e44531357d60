//! Transfer construction and broadcast pipeline.
//!
//! A submission moves through one path: a wallet session is built from the
//! caller's key material (address derivation plus a fresh seqno), a
//! transfer message is composed and fee-estimated, the message is encoded
//! into a bag of cells, and the bytes are broadcast. [`TransferService`]
//! drives that path and serializes concurrent submissions per account.

pub mod broadcast;
pub mod compose;
pub mod contract;
pub mod errors;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use broadcast::BroadcastResult;
pub use compose::{TransferMessage, TRANSFER_OPCODE};
pub use errors::WalletError;
pub use service::{TransferReceipt, TransferRequest, TransferService};
pub use session::{WalletKey, WalletSession};

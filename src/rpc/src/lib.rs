//! RPC transport to the remote ledger node.
//!
//! The gateway talks to the node's JSON-RPC surface for four things: the
//! current sequence number of an account, a dry-run fee estimate, the raw
//! broadcast of an encoded transaction, and transaction/history queries.
//! The [`LedgerRpc`] trait is the seam the rest of the workspace depends
//! on; [`NodeClient`] is the reqwest-backed implementation.

pub mod client;
pub mod errors;
pub mod query;

// Re-export commonly used types
pub use client::{FeeEstimate, LedgerRpc, NodeClient};
pub use errors::RpcError;
pub use query::{LedgerQuery, HISTORY_PAGE_SIZE};

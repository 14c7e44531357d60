//! Integration tests for the TON transfer gateway.

pub mod mock;

pub mod e2e_tests;
pub mod rpc_tests;
pub mod wallet_tests;

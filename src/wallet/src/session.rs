//! Wallet key handling and session state.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cells::Address;
use rpc::LedgerRpc;
use tracing::debug;

use crate::contract::derive_address;
use crate::errors::WalletError;

/// A caller-supplied wallet key and the account address derived from it.
///
/// The request field is named `privateKey` for historical API reasons but
/// carries the base64 Ed25519 *public* key. The gateway validates it and
/// derives the account address; it never signs with anything and never
/// stores the decoded bytes beyond the request lifetime.
#[derive(Clone)]
pub struct WalletKey {
    pub(crate) public_key: [u8; 32],
    pub address: Address,
}

// Key bytes stay out of logs; only the derived address is shown.
impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl WalletKey {
    /// Decodes and validates a base64 key, deriving the wallet address.
    pub fn parse(key_b64: &str) -> Result<Self, WalletError> {
        let bytes = BASE64
            .decode(key_b64.trim())
            .map_err(|e| WalletError::InvalidKey(format!("not valid base64: {e}")))?;
        let public_key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        ed25519_dalek::PublicKey::from_bytes(&public_key)
            .map_err(|_| WalletError::InvalidKey("not a valid Ed25519 point".into()))?;
        let address = derive_address(&public_key)?;
        Ok(WalletKey { public_key, address })
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }
}

/// Per-request wallet state: the account address and its current seqno.
#[derive(Debug, Clone)]
pub struct WalletSession {
    pub address: Address,
    pub seqno: u64,
}

impl WalletSession {
    /// Fetches the live seqno for the key's account. A seqno of zero is a
    /// valid state (uninitialized account), not an error.
    pub async fn open(rpc: &Arc<dyn LedgerRpc>, key: &WalletKey) -> Result<Self, WalletError> {
        let seqno = rpc.seqno(&key.address).await?;
        debug!(address = %key.address, seqno, "opened wallet session");
        Ok(WalletSession {
            address: key.address,
            seqno,
        })
    }
}

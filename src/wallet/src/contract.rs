//! Standard wallet-contract address derivation.
//!
//! An account address is the workchain id plus the representation hash of
//! the account's initial state, which for the standard v3R2 wallet contract
//! is a StateInit cell holding the published contract code and a data cell
//! of (seqno 0, wallet id, public key). The derivation is deterministic:
//! one public key always maps to one address.

use crate::errors::WalletError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cells::{boc, Address, Cell, CellBuilder, EncodingError};

/// Subwallet id baked into the standard v3 wallet data cell.
pub const WALLET_ID: u32 = 698_983_191;

/// Workchain the gateway derives addresses in.
pub const WORKCHAIN: i8 = 0;

/// Published code of the v3R2 wallet contract, as a serialized bag of cells.
const WALLET_CODE_B64: &str = "te6cckEBAQEAcQAA3v8AIN0gggFMl7ohggEznLqxn3Gw7UTQ0x/THzHXC//jBOCk8mCDCNcYINMf0x/TH/gjE7vyY+1E0NMf0x/T/9FRMrryoVFEuvKiBPkBVBBV+RDyo/gAkyDXSpbTB9QC+wDo0QGkyMsfyx/L/8ntVBC9ba0=";

/// Decodes the embedded wallet code cell.
pub fn wallet_code() -> Result<Cell, WalletError> {
    let bytes = BASE64
        .decode(WALLET_CODE_B64)
        .map_err(|e| EncodingError::InvalidBoc(format!("embedded wallet code: {e}")))
        .map_err(WalletError::Encoding)?;
    Ok(boc::deserialize(&bytes)?)
}

/// Derives the account address for a wallet public key.
pub fn derive_address(public_key: &[u8; 32]) -> Result<Address, WalletError> {
    let code = wallet_code()?;

    let mut data = CellBuilder::new();
    data.write_uint(0, 32)?; // initial seqno
    data.write_uint(WALLET_ID as u128, 32)?;
    data.write_bytes(public_key)?;
    let data = data.build();

    // StateInit: no split_depth, no special, code ref, data ref, no library.
    let mut state_init = CellBuilder::new();
    state_init.write_bit(false)?;
    state_init.write_bit(false)?;
    state_init.write_bit(true)?;
    state_init.write_bit(true)?;
    state_init.write_bit(false)?;
    state_init.store_ref(code)?;
    state_init.store_ref(data)?;
    let state_init = state_init.build();

    Ok(Address {
        workchain: WORKCHAIN,
        hash: state_init.repr_hash(),
    })
}

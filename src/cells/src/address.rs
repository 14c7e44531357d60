//! Checksummed account addresses.
//!
//! An address is a workchain identifier plus the 256-bit hash of the
//! account's initial contract state. The user-friendly text form is 36
//! bytes (tag, workchain, hash, CRC16 checksum) in base64; the raw form is
//! `workchain:hex`. Both are accepted on input.

use crate::errors::AddressError;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

/// Tag byte of a bounceable user-friendly address.
pub const BOUNCEABLE_TAG: u8 = 0x11;

/// Tag byte of a non-bounceable user-friendly address.
pub const NON_BOUNCEABLE_TAG: u8 = 0x51;

/// High bit of the tag byte marking a test-only address.
const TEST_ONLY_FLAG: u8 = 0x80;

/// A ledger account address: workchain id plus 256-bit account hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// The workchain identifier
    pub workchain: i8,
    /// The 256-bit hash of the account's initial state
    pub hash: [u8; 32],
}

impl Address {
    /// Parses either text form. The user-friendly form must carry a valid
    /// CRC16 checksum; the raw form is `workchain:hex`.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.contains(':') {
            return Self::parse_raw(input);
        }
        Self::parse_friendly(input)
    }

    fn parse_raw(input: &str) -> Result<Self, AddressError> {
        let (workchain, hash_hex) = input
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidEncoding(input.to_string()))?;
        let workchain: i8 = workchain
            .parse()
            .map_err(|_| AddressError::InvalidEncoding(format!("workchain `{workchain}`")))?;
        let hash_bytes = hex::decode(hash_hex)
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
        let hash: [u8; 32] = hash_bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self { workchain, hash })
    }

    fn parse_friendly(input: &str) -> Result<Self, AddressError> {
        // Both base64 alphabets occur in the wild; normalize to one.
        let normalized: String = input
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        let bytes = STANDARD_NO_PAD
            .decode(normalized.trim_end_matches('='))
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
        if bytes.len() != 36 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let tag = bytes[0] & !TEST_ONLY_FLAG;
        if tag != BOUNCEABLE_TAG && tag != NON_BOUNCEABLE_TAG {
            return Err(AddressError::InvalidTag(bytes[0]));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16_xmodem(&bytes[..34]) != expected {
            return Err(AddressError::BadChecksum);
        }

        let workchain = bytes[1] as i8;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Self { workchain, hash })
    }

    /// Formats the user-friendly base64 form (URL-safe alphabet).
    pub fn to_base64(&self, bounceable: bool) -> String {
        let tag = if bounceable {
            BOUNCEABLE_TAG
        } else {
            NON_BOUNCEABLE_TAG
        };
        let mut bytes = [0u8; 36];
        bytes[0] = tag;
        bytes[1] = self.workchain as u8;
        bytes[2..34].copy_from_slice(&self.hash);
        let checksum = crc16_xmodem(&bytes[..34]);
        bytes[34..36].copy_from_slice(&checksum.to_be_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// CRC16/XMODEM over the first 34 address bytes.
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

//! Error types for the cells crate.

use thiserror::Error;

/// Errors that can occur while building, serializing or decoding cells.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// Error when a write would exceed a cell's 1023-bit data capacity.
    #[error("Cell data overflow: {used} bits used, {requested} more requested (limit 1023)")]
    BitOverflow {
        /// Bits already written to the cell
        used: usize,
        /// Bits the rejected write asked for
        requested: usize,
    },

    /// Error when a cell would hold more than 4 child references.
    #[error("Cell reference overflow: a cell holds at most 4 references")]
    RefOverflow,

    /// Error when a value does not fit in the requested bit width.
    #[error("Value does not fit in {bits} bits")]
    ValueTooWide {
        /// The requested bit width
        bits: usize,
    },

    /// Error when a read runs past the end of a cell's data.
    #[error("Cell data underflow: {requested} bits requested, {available} available")]
    Underflow {
        /// Bits the read asked for
        requested: usize,
        /// Bits remaining in the cell
        available: usize,
    },

    /// Error when a read asks for a child reference the cell does not have.
    #[error("Cell reference underflow")]
    RefUnderflow,

    /// Error when a bag-of-cells byte sequence is malformed.
    #[error("Malformed bag of cells: {0}")]
    InvalidBoc(String),
}

/// Errors that can occur while parsing or validating an account address.
#[derive(Error, Debug)]
pub enum AddressError {
    /// Error when the decoded address has the wrong byte length.
    #[error("Invalid address length: {0} bytes (expected 36)")]
    InvalidLength(usize),

    /// Error when the address checksum does not match.
    #[error("Invalid address checksum")]
    BadChecksum,

    /// Error when the address carries an unknown tag byte.
    #[error("Invalid address tag: {0:#04x}")]
    InvalidTag(u8),

    /// Error when the address text form cannot be decoded.
    #[error("Invalid address encoding: {0}")]
    InvalidEncoding(String),
}

//! Cell-level primitives for the TON transfer gateway.
//!
//! This crate provides the canonical binary building blocks of the ledger's
//! transaction format: the bounded cell tree (`Cell`, `CellBuilder`,
//! `CellSlice`), the bag-of-cells wire codec (`boc`), and checksummed
//! account addresses (`Address`). Everything here is pure and deterministic;
//! no I/O happens in this crate.

pub mod address;
pub mod boc;
pub mod cell;
pub mod errors;

// Re-export commonly used types
pub use address::Address;
pub use cell::{Cell, CellBuilder, CellSlice, MAX_CELL_BITS, MAX_CELL_REFS};
pub use errors::{AddressError, EncodingError};

//! The bounded cell tree and its bit-level builder and reader.
//!
//! A cell holds at most 1023 bits of payload and at most 4 ordered child
//! references. Every transaction body the gateway produces is a tree of
//! cells, and every byte the node sees is derived from the canonical
//! representation defined here, so writes and hashes must be bit-exact.

use crate::address::Address;
use crate::errors::EncodingError;
use bitvec::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Maximum number of payload bits in a single cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of child references in a single cell.
pub const MAX_CELL_REFS: usize = 4;

/// Maximum byte length of a variable-length coin amount (4-bit length nibble).
const MAX_COIN_BYTES: u32 = 15;

/// An immutable node of the transaction cell tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    bits: BitVec<u8, Msb0>,
    refs: Vec<Arc<Cell>>,
}

impl Cell {
    /// Creates a cell from raw parts, enforcing the capacity limits.
    pub(crate) fn try_new(
        bits: BitVec<u8, Msb0>,
        refs: Vec<Arc<Cell>>,
    ) -> Result<Self, EncodingError> {
        if bits.len() > MAX_CELL_BITS {
            return Err(EncodingError::BitOverflow {
                used: bits.len(),
                requested: 0,
            });
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(EncodingError::RefOverflow);
        }
        Ok(Self { bits, refs })
    }

    /// Number of payload bits in this cell.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// The payload bits.
    pub fn data(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    /// The ordered child references.
    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Depth of the subtree rooted at this cell (0 for a leaf).
    pub fn depth(&self) -> u16 {
        self.refs
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// The two descriptor bytes of the canonical representation:
    /// d1 = reference count, d2 encodes the payload bit length.
    pub fn descriptors(&self) -> [u8; 2] {
        let bits = self.bits.len();
        let d1 = self.refs.len() as u8;
        let d2 = (bits / 8 + (bits + 7) / 8) as u8;
        [d1, d2]
    }

    /// Payload bytes with the completion tag: when the bit length is not a
    /// multiple of 8, a single 1 bit followed by zeros pads the last byte.
    pub fn packed_data(&self) -> Vec<u8> {
        let len = self.bits.len();
        let mut out = vec![0u8; (len + 7) / 8];
        for (i, bit) in self.bits.iter().by_vals().enumerate() {
            if bit {
                out[i / 8] |= 1 << (7 - i % 8);
            }
        }
        if len % 8 != 0 {
            out[len / 8] |= 1 << (7 - len % 8);
        }
        out
    }

    /// The representation hash of this cell: SHA-256 over the descriptors,
    /// the completion-tagged payload, then the depths and representation
    /// hashes of every child. Structurally identical cells hash identically,
    /// which is what the bag-of-cells serializer deduplicates on.
    pub fn repr_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.descriptors());
        hasher.update(self.packed_data());
        for child in &self.refs {
            hasher.update(child.depth().to_be_bytes());
        }
        for child in &self.refs {
            hasher.update(child.repr_hash());
        }
        hasher.finalize().into()
    }

    /// Returns a reader positioned at the start of this cell.
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            bit_pos: 0,
            ref_pos: 0,
        }
    }
}

/// Incrementally builds a cell, rejecting writes that would overflow it.
#[derive(Debug, Default)]
pub struct CellBuilder {
    bits: BitVec<u8, Msb0>,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    fn ensure_capacity(&self, extra: usize) -> Result<(), EncodingError> {
        if self.bits.len() + extra > MAX_CELL_BITS {
            return Err(EncodingError::BitOverflow {
                used: self.bits.len(),
                requested: extra,
            });
        }
        Ok(())
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<&mut Self, EncodingError> {
        self.ensure_capacity(1)?;
        self.bits.push(bit);
        Ok(self)
    }

    /// Writes an unsigned big-endian integer into exactly `bits` bits.
    pub fn write_uint(&mut self, value: u128, bits: usize) -> Result<&mut Self, EncodingError> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return Err(EncodingError::ValueTooWide { bits });
        }
        self.ensure_capacity(bits)?;
        for i in (0..bits).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Writes raw bytes, most significant bit first.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<&mut Self, EncodingError> {
        self.ensure_capacity(data.len() * 8)?;
        self.bits.extend_from_bitslice(data.view_bits::<Msb0>());
        Ok(self)
    }

    /// Writes a coin amount in the variable-length "grams" form: a 4-bit
    /// nibble giving the byte length of the value, then that many big-endian
    /// bytes. Zero encodes as nibble 0 with no value bytes; the byte length
    /// is always minimal, making the encoding canonical.
    pub fn write_coins(&mut self, amount: u128) -> Result<&mut Self, EncodingError> {
        let byte_len = (128 - amount.leading_zeros() + 7) / 8;
        if byte_len > MAX_COIN_BYTES {
            return Err(EncodingError::ValueTooWide {
                bits: MAX_COIN_BYTES as usize * 8,
            });
        }
        self.write_uint(byte_len as u128, 4)?;
        self.write_uint(amount, byte_len as usize * 8)?;
        Ok(self)
    }

    /// Writes a standard internal address: the `addr_std` tag `10`, no
    /// anycast, an 8-bit workchain and the 256-bit account hash.
    pub fn write_address(&mut self, address: &Address) -> Result<&mut Self, EncodingError> {
        self.write_uint(0b10, 2)?;
        self.write_bit(false)?;
        self.write_uint(address.workchain as u8 as u128, 8)?;
        self.write_bytes(&address.hash)?;
        Ok(self)
    }

    /// Attaches a child cell.
    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self, EncodingError> {
        if self.refs.len() == MAX_CELL_REFS {
            return Err(EncodingError::RefOverflow);
        }
        self.refs.push(Arc::new(cell));
        Ok(self)
    }

    /// Finishes the cell. Infallible because every write was bounds-checked.
    pub fn build(self) -> Cell {
        Cell {
            bits: self.bits,
            refs: self.refs,
        }
    }
}

/// A cursor over a cell's payload bits and child references.
#[derive(Debug)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    /// Bits left to read.
    pub fn remaining_bits(&self) -> usize {
        self.cell.bits.len() - self.bit_pos
    }

    fn take_bits(&mut self, count: usize) -> Result<usize, EncodingError> {
        if count > self.remaining_bits() {
            return Err(EncodingError::Underflow {
                requested: count,
                available: self.remaining_bits(),
            });
        }
        let start = self.bit_pos;
        self.bit_pos += count;
        Ok(start)
    }

    /// Reads a single bit.
    pub fn load_bit(&mut self) -> Result<bool, EncodingError> {
        let start = self.take_bits(1)?;
        Ok(self.cell.bits[start])
    }

    /// Reads an unsigned big-endian integer of `bits` bits.
    pub fn load_uint(&mut self, bits: usize) -> Result<u128, EncodingError> {
        if bits > 128 {
            return Err(EncodingError::ValueTooWide { bits });
        }
        let start = self.take_bits(bits)?;
        let mut value: u128 = 0;
        for i in 0..bits {
            value = (value << 1) | u128::from(self.cell.bits[start + i]);
        }
        Ok(value)
    }

    /// Reads `count` whole bytes.
    pub fn load_bytes(&mut self, count: usize) -> Result<Vec<u8>, EncodingError> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.load_uint(8)? as u8);
        }
        Ok(out)
    }

    /// Reads a variable-length coin amount written by
    /// [`CellBuilder::write_coins`].
    pub fn load_coins(&mut self) -> Result<u128, EncodingError> {
        let byte_len = self.load_uint(4)? as usize;
        self.load_uint(byte_len * 8)
    }

    /// Reads a standard internal address written by
    /// [`CellBuilder::write_address`].
    pub fn load_address(&mut self) -> Result<Address, EncodingError> {
        let tag = self.load_uint(2)?;
        if tag != 0b10 {
            return Err(EncodingError::InvalidBoc(format!(
                "unsupported address tag {tag:#b}"
            )));
        }
        let anycast = self.load_bit()?;
        if anycast {
            return Err(EncodingError::InvalidBoc(
                "anycast addresses are not supported".to_string(),
            ));
        }
        let workchain = self.load_uint(8)? as u8 as i8;
        let hash_bytes = self.load_bytes(32)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hash_bytes);
        Ok(Address { workchain, hash })
    }

    /// Takes the next child reference in order.
    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>, EncodingError> {
        let child = self
            .cell
            .refs
            .get(self.ref_pos)
            .ok_or(EncodingError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(child)
    }
}

//! Bag-of-cells wire codec.
//!
//! Serializes a cell tree into the canonical byte form broadcast to the
//! node, and decodes such bytes back into a tree. Serialization is
//! deterministic: cells are deduplicated by representation hash and ordered
//! so every reference points forward, so one logical transaction always
//! yields one byte sequence.

use crate::cell::Cell;
use crate::errors::EncodingError;
use bitvec::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Magic prefix of a serialized bag of cells.
pub const BOC_MAGIC: [u8; 4] = [0xB5, 0xEE, 0x9C, 0x72];

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;
const REF_SIZE_MASK: u8 = 0x07;

/// Serializes a cell tree with the CRC32C trailer the reference tooling
/// emits.
pub fn serialize(root: &Cell) -> Result<Vec<u8>, EncodingError> {
    serialize_with(root, true)
}

/// Serializes a cell tree, optionally appending the CRC32C trailer.
pub fn serialize_with(root: &Cell, include_crc: bool) -> Result<Vec<u8>, EncodingError> {
    let cells = collect_cells(root);
    let index: HashMap<[u8; 32], usize> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.repr_hash(), i))
        .collect();

    let size_bytes = min_bytes(cells.len() as u64);

    // Per-cell records: descriptors, tagged payload, child indices.
    let mut records = Vec::with_capacity(cells.len());
    let mut total_size: u64 = 0;
    for cell in &cells {
        let mut record = Vec::new();
        record.extend_from_slice(&cell.descriptors());
        record.extend_from_slice(&cell.packed_data());
        for child in cell.refs() {
            let child_index = index[&child.repr_hash()];
            record.extend_from_slice(&be_bytes(child_index as u64, size_bytes));
        }
        total_size += record.len() as u64;
        records.push(record);
    }
    let offset_bytes = min_bytes(total_size);

    let mut out = Vec::new();
    out.extend_from_slice(&BOC_MAGIC);
    let mut flags = size_bytes as u8;
    if include_crc {
        flags |= FLAG_HAS_CRC;
    }
    out.push(flags);
    out.push(offset_bytes as u8);
    out.extend_from_slice(&be_bytes(cells.len() as u64, size_bytes));
    out.extend_from_slice(&be_bytes(1, size_bytes)); // root count
    out.extend_from_slice(&be_bytes(0, size_bytes)); // absent count
    out.extend_from_slice(&be_bytes(total_size, offset_bytes));
    out.extend_from_slice(&be_bytes(0, size_bytes)); // root index
    for record in &records {
        out.extend_from_slice(record);
    }
    if include_crc {
        let checksum = crc32c(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
    }
    Ok(out)
}

/// Decodes a serialized bag of cells back into its root cell.
pub fn deserialize(bytes: &[u8]) -> Result<Cell, EncodingError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.take(4)?;
    if magic != BOC_MAGIC {
        return Err(EncodingError::InvalidBoc(format!(
            "bad magic {}",
            hex::encode(magic)
        )));
    }

    let flags = reader.take_u8()?;
    if flags & FLAG_HAS_CACHE_BITS != 0 {
        return Err(EncodingError::InvalidBoc(
            "cache bits are not supported".to_string(),
        ));
    }
    let has_index = flags & FLAG_HAS_INDEX != 0;
    let has_crc = flags & FLAG_HAS_CRC != 0;
    let size_bytes = (flags & REF_SIZE_MASK) as usize;
    if size_bytes == 0 || size_bytes > 8 {
        return Err(EncodingError::InvalidBoc(format!(
            "bad reference size {size_bytes}"
        )));
    }

    if has_crc {
        if bytes.len() < 4 {
            return Err(EncodingError::InvalidBoc("truncated checksum".to_string()));
        }
        let body = &bytes[..bytes.len() - 4];
        let expected = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
        if crc32c(body) != expected {
            return Err(EncodingError::InvalidBoc("checksum mismatch".to_string()));
        }
    }

    let offset_bytes = reader.take_u8()? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(EncodingError::InvalidBoc(format!(
            "bad offset size {offset_bytes}"
        )));
    }
    let cell_count = reader.take_uint(size_bytes)? as usize;
    let root_count = reader.take_uint(size_bytes)? as usize;
    if root_count != 1 {
        return Err(EncodingError::InvalidBoc(format!(
            "expected a single root, got {root_count}"
        )));
    }
    let absent_count = reader.take_uint(size_bytes)? as usize;
    if absent_count != 0 {
        return Err(EncodingError::InvalidBoc(
            "absent cells are not supported".to_string(),
        ));
    }
    let _total_size = reader.take_uint(offset_bytes)?;
    let root_index = reader.take_uint(size_bytes)? as usize;
    if root_index >= cell_count {
        return Err(EncodingError::InvalidBoc(format!(
            "root index {root_index} out of range"
        )));
    }
    if has_index {
        reader.take(cell_count * offset_bytes)?;
    }

    // First pass: raw records, references as forward indices.
    let mut raw: Vec<(BitVec<u8, Msb0>, Vec<usize>)> = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        let d1 = reader.take_u8()?;
        if d1 & 0x08 != 0 {
            return Err(EncodingError::InvalidBoc(
                "exotic cells are not supported".to_string(),
            ));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > 4 {
            return Err(EncodingError::InvalidBoc(format!(
                "cell {i} claims {ref_count} references"
            )));
        }
        let d2 = reader.take_u8()? as usize;
        let data = reader.take((d2 + 1) / 2)?;
        let bits = unpack_bits(data, d2)?;
        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let child = reader.take_uint(size_bytes)? as usize;
            if child <= i || child >= cell_count {
                return Err(EncodingError::InvalidBoc(format!(
                    "cell {i} references {child} out of order"
                )));
            }
            refs.push(child);
        }
        raw.push((bits, refs));
    }

    // Second pass, bottom-up: indices always point forward, so children are
    // ready before their parents.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for (i, (bits, refs)) in raw.into_iter().enumerate().rev() {
        let children = refs
            .into_iter()
            .map(|child| built[child].clone().expect("forward reference built"))
            .collect();
        built[i] = Some(Arc::new(Cell::try_new(bits, children)?));
    }

    let root = built[root_index].take().expect("root built");
    Ok(Arc::try_unwrap(root).unwrap_or_else(|arc| (*arc).clone()))
}

/// Unique cells of the tree, parents strictly before children.
///
/// Cells are first collected in discovery order with content-hash dedup,
/// then stably sorted by descending depth: a parent is always deeper than
/// any of its children, so every reference points forward even when a cell
/// is shared by several parents.
fn collect_cells(root: &Cell) -> Vec<Cell> {
    fn walk(cell: &Cell, seen: &mut HashMap<[u8; 32], usize>, out: &mut Vec<Cell>) {
        let hash = cell.repr_hash();
        if seen.contains_key(&hash) {
            return;
        }
        seen.insert(hash, out.len());
        out.push(cell.clone());
        for child in cell.refs() {
            walk(child, seen, out);
        }
    }

    let mut seen = HashMap::new();
    let mut cells = Vec::new();
    walk(root, &mut seen, &mut cells);
    cells.sort_by_key(|cell| std::cmp::Reverse(cell.depth()));
    cells
}

/// Rebuilds a bit string from packed bytes and the d2 descriptor: an odd d2
/// means the last byte ends with a completion tag that must be stripped.
fn unpack_bits(data: &[u8], d2: usize) -> Result<BitVec<u8, Msb0>, EncodingError> {
    let mut bits = BitVec::<u8, Msb0>::from_slice(data);
    let bit_len = if d2 % 2 == 0 {
        d2 / 2 * 8
    } else {
        let last = *data.last().ok_or_else(|| {
            EncodingError::InvalidBoc("missing completion tag".to_string())
        })?;
        if last == 0 {
            return Err(EncodingError::InvalidBoc(
                "missing completion tag".to_string(),
            ));
        }
        (d2 / 2) * 8 + 7 - last.trailing_zeros() as usize
    };
    bits.truncate(bit_len);
    Ok(bits)
}

fn min_bytes(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

fn be_bytes(value: u64, len: usize) -> Vec<u8> {
    value.to_be_bytes()[8 - len..].to_vec()
}

/// CRC32C (Castagnoli), the checksum the reference tooling appends.
fn crc32c(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0x82F6_3B78 & mask);
        }
    }
    !crc
}

/// Simple byte cursor over the serialized form.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], EncodingError> {
        if self.pos + count > self.buf.len() {
            return Err(EncodingError::InvalidBoc(format!(
                "truncated at byte {}",
                self.buf.len()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.take(1)?[0])
    }

    fn take_uint(&mut self, len: usize) -> Result<u64, EncodingError> {
        let bytes = self.take(len)?;
        let mut value: u64 = 0;
        for &byte in bytes {
            value = (value << 8) | byte as u64;
        }
        Ok(value)
    }
}

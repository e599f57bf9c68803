//! Block decompression.
//!
//! Decoding uses a single-level lookup table of `2^table_log` entries: peek
//! `table_log` bits, read the symbol and its true length, consume only that
//! length. The caller supplies the regenerated size by sizing `dst`; the
//! stream carries no length of its own.

use super::table::read_weights;
use super::{starting_values_per_rank, TABLE_LOG_MAX};
use crate::bitstream::BitReader;
use crate::error::{Error, Result};

/// One decode-table entry, replicated across every index sharing its code
/// prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DEntry {
    symbol: u8,
    num_bits: u8,
}

/// Decoder-side lookup table.
#[derive(Debug, Clone)]
pub struct DTable {
    entries: Vec<DEntry>,
    table_log: u8,
}

impl DTable {
    /// Build a decode table from a full weight vector (reconstructed last
    /// weight included).
    ///
    /// `table_log` must be the log inferred from the weight sum, not the
    /// largest weight: a table whose shortest code is longer than one bit
    /// has `max_weight < table_log`.
    pub fn from_weights(weights: &[u8], table_log: u8) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::corrupted("empty weight vector"));
        }
        if table_log == 0 || table_log > TABLE_LOG_MAX {
            return Err(Error::TableLogTooLarge {
                value: table_log as u32,
                max: TABLE_LOG_MAX as u32,
            });
        }

        // lengths from weights, with the Kraft equality checked exactly
        let mut nb_per_rank = [0u16; TABLE_LOG_MAX as usize + 1];
        let mut kraft = 0u64;
        for &w in weights {
            if w > table_log {
                return Err(Error::corrupted("weight exceeds table log"));
            }
            if w > 0 {
                let bits = table_log + 1 - w;
                nb_per_rank[bits as usize] += 1;
                kraft += 1u64 << (table_log - bits);
            }
        }
        if kraft != 1u64 << table_log {
            return Err(Error::corrupted("weights do not form a complete code"));
        }

        let mut val_per_rank = starting_values_per_rank(&nb_per_rank, table_log);
        let mut entries = vec![DEntry::default(); 1usize << table_log];
        for (symbol, &w) in weights.iter().enumerate() {
            if w == 0 {
                continue;
            }
            let bits = table_log + 1 - w;
            let code = val_per_rank[bits as usize];
            val_per_rank[bits as usize] += 1;

            // the code owns every index it prefixes
            let spread = table_log - bits;
            let base = (code as usize) << spread;
            let entry = DEntry {
                symbol: symbol as u8,
                num_bits: bits,
            };
            for slot in &mut entries[base..base + (1usize << spread)] {
                *slot = entry;
            }
        }

        Ok(Self { entries, table_log })
    }

    /// Parse a table header and build the decode table.
    ///
    /// Returns the table and the header bytes consumed.
    pub fn read(src: &[u8]) -> Result<(Self, usize)> {
        let stats = read_weights(src)?;
        let table = Self::from_weights(&stats.weights[..stats.num_symbols], stats.table_log)?;
        Ok((table, stats.bytes_read))
    }

    /// Largest code length in the table.
    #[inline]
    pub fn table_log(&self) -> u8 {
        self.table_log
    }

    #[inline]
    fn decode_symbol(&self, bits: &mut BitReader<'_>) -> Result<u8> {
        let index = bits.peek_bits_padded(self.table_log as usize)? as usize;
        let entry = self.entries[index];
        if entry.num_bits == 0 {
            return Err(Error::corrupted("invalid code in stream"));
        }
        bits.read_bits(entry.num_bits as usize)?;
        Ok(entry.symbol)
    }
}

/// Decompress a single-stream block (header + payload), filling all of
/// `dst`.
pub fn decompress_1x(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let (table, consumed) = DTable::read(src)?;
    decompress_1x_using_table(dst, &src[consumed..], &table)?;
    Ok(dst.len())
}

/// Decompress a four-stream block (header + jump table + payload), filling
/// all of `dst`.
pub fn decompress_4x(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let (table, consumed) = DTable::read(src)?;
    decompress_4x_using_table(dst, &src[consumed..], &table)?;
    Ok(dst.len())
}

/// Decompress a headerless single-stream payload with a caller-provided
/// table, as produced by the table-reuse path.
pub fn decompress_1x_using_table(dst: &mut [u8], src: &[u8], table: &DTable) -> Result<()> {
    let mut bits = BitReader::new_reversed(src)?;
    for out in dst.iter_mut() {
        *out = table.decode_symbol(&mut bits)?;
    }
    if bits.bits_remaining() != 0 {
        return Err(Error::corrupted("stream not fully consumed"));
    }
    Ok(())
}

/// Decompress a headerless four-stream payload with a caller-provided
/// table.
pub fn decompress_4x_using_table(dst: &mut [u8], src: &[u8], table: &DTable) -> Result<()> {
    if src.len() < 10 {
        return Err(Error::corrupted("four-stream payload too short"));
    }
    let segment_size = dst.len().div_ceil(4);
    if segment_size * 3 > dst.len() {
        return Err(Error::corrupted("regenerated size too small for four streams"));
    }

    let len1 = u16::from_le_bytes([src[0], src[1]]) as usize;
    let len2 = u16::from_le_bytes([src[2], src[3]]) as usize;
    let len3 = u16::from_le_bytes([src[4], src[5]]) as usize;
    let payload = &src[6..];
    let len123 = len1
        .checked_add(len2)
        .and_then(|n| n.checked_add(len3))
        .ok_or_else(|| Error::corrupted("jump table overflow"))?;
    if len123 >= payload.len() {
        return Err(Error::corrupted("jump table exceeds payload"));
    }

    let (stream1, rest) = payload.split_at(len1);
    let (stream2, rest) = rest.split_at(len2);
    let (stream3, stream4) = rest.split_at(len3);

    let (seg1, rest) = dst.split_at_mut(segment_size);
    let (seg2, rest) = rest.split_at_mut(segment_size);
    let (seg3, seg4) = rest.split_at_mut(segment_size);

    decompress_1x_using_table(seg1, stream1, table)?;
    decompress_1x_using_table(seg2, stream2, table)?;
    decompress_1x_using_table(seg3, stream3, table)?;
    decompress_1x_using_table(seg4, stream4, table)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

//! Code table serialization.
//!
//! The table travels as a weight vector over symbols `0..max_symbol`; the
//! last present symbol's weight is omitted and reconstructed through the
//! Kraft equality. Two encodings compete: an FSE-compressed payload and raw
//! 4-bit nibbles. The discriminator byte keeps them apart — an FSE payload
//! length is forced below 128, raw headers start at 128 — so the `h < M/2`
//! acceptance test is a correctness constraint, not only a size heuristic.

use super::{
    starting_values_per_rank, CTable, MAX_SYMBOLS, TABLE_LOG_ABSOLUTE_MAX, TABLE_LOG_MAX,
};
use crate::error::{Error, Result};
use crate::fse::{self, highbit32};

/// Serialize `ctable` into `dst`, returning the header size in bytes.
///
/// `max_symbol` is the largest symbol present and `table_log` the largest
/// code length (as returned by [`super::build_ctable`]).
pub fn write_table(dst: &mut [u8], ctable: &CTable, max_symbol: u8, table_log: u8) -> Result<usize> {
    if table_log > TABLE_LOG_MAX {
        return Err(Error::TableLogTooLarge {
            value: table_log as u32,
            max: TABLE_LOG_MAX as u32,
        });
    }
    if dst.is_empty() {
        return Err(Error::dst_too_small(1, 0));
    }
    if max_symbol == 0 {
        // a one-symbol block is an RLE case, never a serialized table
        return Err(Error::Generic("table must cover at least two symbols"));
    }

    // code length -> weight, with length 0 staying weight 0
    let mut bits_to_weight = [0u8; TABLE_LOG_MAX as usize + 2];
    for n in 1..=table_log as usize {
        bits_to_weight[n] = table_log + 1 - n as u8;
    }
    let mut weights = [0u8; MAX_SYMBOLS];
    for n in 0..max_symbol as usize {
        weights[n] = bits_to_weight[ctable.codes[n].n_bits as usize];
    }

    // FSE attempt; the budget keeps the discriminator below 128
    let budget = (dst.len() - 1).min(127);
    if let Some(h_size) = fse::compress_weights(&mut dst[1..1 + budget], &weights[..max_symbol as usize])? {
        if h_size > 1 && h_size < max_symbol as usize / 2 {
            dst[0] = h_size as u8;
            return Ok(h_size + 1);
        }
    }

    // raw 4-bit weights, two per byte
    if max_symbol as usize > 128 {
        // wide alphabets that resist FSE are effectively incompressible
        return Err(Error::Generic("alphabet too wide for raw weight header"));
    }
    let raw_size = (max_symbol as usize + 1) / 2 + 1;
    if raw_size > dst.len() {
        return Err(Error::dst_too_small(raw_size, dst.len()));
    }
    dst[0] = 128 + (max_symbol - 1);
    for n in (0..max_symbol as usize).step_by(2) {
        dst[n / 2 + 1] = (weights[n] << 4) + weights[n + 1];
    }
    Ok(raw_size)
}

/// Weight vector recovered from a serialized table, last weight included.
pub(crate) struct WeightStats {
    pub weights: [u8; MAX_SYMBOLS],
    pub rank_count: [u32; TABLE_LOG_ABSOLUTE_MAX as usize + 1],
    pub num_symbols: usize,
    pub table_log: u8,
    pub bytes_read: usize,
}

/// Parse a table header: weights, their rank statistics, and the inferred
/// table log.
///
/// The omitted last weight is pinned by Kraft completion: the transmitted
/// weights' `2^(w-1)` sum must land a clean power of two short of
/// `2^table_log`, and that gap is the last symbol's weight. Anything else is
/// corruption.
pub(crate) fn read_weights(src: &[u8]) -> Result<WeightStats> {
    if src.is_empty() {
        return Err(Error::corrupted("empty table header"));
    }

    let header = src[0] as usize;
    let mut weights = [0u8; MAX_SYMBOLS];
    let num_transmitted;
    let bytes_read;

    if header >= 128 {
        // raw 4-bit representation
        let o_size = header - 127;
        let i_size = (o_size + 1) / 2;
        if i_size + 1 > src.len() {
            return Err(Error::corrupted("truncated raw weight header"));
        }
        for n in 0..o_size {
            let byte = src[n / 2 + 1];
            weights[n] = if n % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        }
        num_transmitted = o_size;
        bytes_read = i_size + 1;
    } else {
        // FSE-compressed payload of `header` bytes
        let i_size = header;
        if i_size == 0 {
            return Err(Error::corrupted("empty weight payload"));
        }
        if i_size + 1 > src.len() {
            return Err(Error::corrupted("truncated weight payload"));
        }
        let decoded = fse::decompress_weights(&src[1..1 + i_size])?;
        if decoded.len() >= MAX_SYMBOLS {
            return Err(Error::corrupted("weight payload describes too many symbols"));
        }
        weights[..decoded.len()].copy_from_slice(&decoded);
        num_transmitted = decoded.len();
        bytes_read = i_size + 1;
    }

    if num_transmitted == 0 {
        return Err(Error::corrupted("table header describes no symbols"));
    }

    let mut rank_count = [0u32; TABLE_LOG_ABSOLUTE_MAX as usize + 1];
    let mut weight_total = 0u32;
    for &w in &weights[..num_transmitted] {
        if w > TABLE_LOG_MAX {
            return Err(Error::corrupted("weight exceeds maximum code length"));
        }
        rank_count[w as usize] += 1;
        weight_total += (1u32 << w) >> 1;
    }
    if weight_total == 0 {
        return Err(Error::corrupted("all transmitted weights are zero"));
    }

    let table_log = highbit32(weight_total) + 1;
    if table_log > TABLE_LOG_MAX as u32 {
        return Err(Error::TableLogTooLarge {
            value: table_log,
            max: TABLE_LOG_MAX as u32,
        });
    }

    let total = 1u32 << table_log;
    let rest = total - weight_total;
    let last_weight = highbit32(rest) + 1;
    if 1u32 << (last_weight - 1) != rest {
        return Err(Error::corrupted("weights do not complete a canonical code"));
    }
    weights[num_transmitted] = last_weight as u8;
    rank_count[last_weight as usize] += 1;

    // a complete binary code has an even, non-zero number of deepest codes
    if rank_count[1] < 2 || rank_count[1] & 1 != 0 {
        return Err(Error::corrupted("invalid code rank structure"));
    }

    Ok(WeightStats {
        weights,
        rank_count,
        num_symbols: num_transmitted + 1,
        table_log: table_log as u8,
        bytes_read,
    })
}

/// Reconstruct a code table from a serialized header.
///
/// Returns the table, the largest symbol it covers, its table log, and the
/// header size consumed. Absent symbols come back with `n_bits == 0`.
pub fn read_table(src: &[u8]) -> Result<(CTable, u8, u8, usize)> {
    let stats = read_weights(src)?;
    let table_log = stats.table_log;

    let mut ctable = CTable::default();
    let mut nb_per_rank = [0u16; TABLE_LOG_MAX as usize + 1];
    for n in 0..stats.num_symbols {
        let w = stats.weights[n];
        if w > 0 {
            let bits = table_log + 1 - w;
            ctable.codes[n].n_bits = bits;
            nb_per_rank[bits as usize] += 1;
        }
    }

    let mut val_per_rank = starting_values_per_rank(&nb_per_rank, table_log);
    for n in 0..stats.num_symbols {
        let bits = ctable.codes[n].n_bits as usize;
        if bits > 0 {
            ctable.codes[n].value = val_per_rank[bits];
            val_per_rank[bits] += 1;
        }
    }

    Ok((
        ctable,
        (stats.num_symbols - 1) as u8,
        table_log,
        stats.bytes_read,
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::{build_ctable, Node, NODE_TABLE_SIZE};
    use super::*;

    fn table_for(count: &[u32; MAX_SYMBOLS], max_symbol: u8) -> (CTable, u8) {
        let mut ctable = CTable::default();
        let mut nodes = [Node::default(); NODE_TABLE_SIZE];
        let log = build_ctable(&mut ctable, count, max_symbol, 11, &mut nodes).unwrap();
        (ctable, log)
    }

    #[test]
    fn test_raw_header_roundtrip() {
        let mut count = [0u32; MAX_SYMBOLS];
        for s in 0..6 {
            count[s] = 1 << s;
        }
        let (ctable, log) = table_for(&count, 5);

        let mut dst = [0u8; 64];
        let h_size = write_table(&mut dst, &ctable, 5, log).unwrap();
        assert!(dst[0] >= 128, "small alphabet should use the raw header");

        let (parsed, max_symbol, parsed_log, consumed) = read_table(&dst[..h_size]).unwrap();
        assert_eq!(consumed, h_size);
        assert_eq!(max_symbol, 5);
        assert_eq!(parsed_log, log);
        for s in 0..6 {
            assert_eq!(parsed.codes[s], ctable.codes[s], "symbol {s} differs");
        }
    }

    #[test]
    fn test_roundtrip_preserves_absent_symbols() {
        let mut count = [0u32; MAX_SYMBOLS];
        count[0] = 100;
        count[7] = 60;
        count[31] = 30;
        count[32] = 17;
        let (ctable, log) = table_for(&count, 32);

        let mut dst = [0u8; 64];
        let h_size = write_table(&mut dst, &ctable, 32, log).unwrap();
        let (parsed, max_symbol, _, _) = read_table(&dst[..h_size]).unwrap();

        assert_eq!(max_symbol, 32);
        for s in 0..=32usize {
            assert_eq!(parsed.codes[s], ctable.codes[s], "symbol {s} differs");
        }
        assert_eq!(parsed.codes[5].n_bits, 0);
        assert_eq!(parsed.codes[5].value, 0);
    }

    #[test]
    fn test_fse_header_roundtrip() {
        // a wide, skewed alphabet drives the weight vector into FSE range
        let mut count = [0u32; MAX_SYMBOLS];
        for s in 0..200 {
            count[s] = if s % 3 == 0 { 900 } else { 20 };
        }
        let (ctable, log) = table_for(&count, 199);

        let mut dst = [0u8; 256];
        let h_size = write_table(&mut dst, &ctable, 199, log).unwrap();
        assert!(dst[0] < 128, "wide alphabet should use the FSE header");
        assert_eq!(dst[0] as usize, h_size - 1);

        let (parsed, max_symbol, parsed_log, consumed) = read_table(&dst[..h_size]).unwrap();
        assert_eq!(consumed, h_size);
        assert_eq!(max_symbol, 199);
        assert_eq!(parsed_log, log);
        for s in 0..200 {
            assert_eq!(parsed.codes[s], ctable.codes[s], "symbol {s} differs");
        }
    }

    #[test]
    fn test_discriminator_boundary() {
        // FSE acceptance requires h < max_symbol / 2 <= 127, so the two
        // header families cannot collide
        let mut count = [0u32; MAX_SYMBOLS];
        for s in 0..=255usize {
            count[s] = (s as u32 % 13) * 40 + 1;
        }
        let (ctable, log) = table_for(&count, 255);
        let mut dst = [0u8; 256];
        let h_size = write_table(&mut dst, &ctable, 255, log).unwrap();
        if dst[0] < 128 {
            assert!((dst[0] as usize) < 128);
            assert!((h_size - 1) < 255 / 2);
        }
    }

    #[test]
    fn test_write_rejects_tiny_dst() {
        let mut count = [0u32; MAX_SYMBOLS];
        for s in 0..40 {
            count[s] = s as u32 + 1;
        }
        let (ctable, log) = table_for(&count, 39);
        let mut dst = [0u8; 4];
        assert!(write_table(&mut dst, &ctable, 39, log).is_err());
    }

    #[test]
    fn test_read_rejects_truncated_header() {
        let data = [0x85u8, 0x21]; // claims 6 symbols, 3 weight bytes
        assert!(read_table(&data).is_err());
    }

    #[test]
    fn test_read_rejects_broken_kraft() {
        // transmitted weights [3, 3, 1] sum to 9; the gap to 16 is 7, not a
        // power of two, so no last weight can complete the code
        let data = [128u8 + 2, 0x33, 0x10];
        assert!(read_table(&data).is_err());
    }

    #[test]
    fn test_read_rejects_empty() {
        assert!(read_table(&[]).is_err());
    }

    #[test]
    fn test_read_recovers_last_weight() {
        // two equal symbols: weights {1, 1}, only the first transmitted
        let mut count = [0u32; MAX_SYMBOLS];
        count[0] = 5;
        count[1] = 5;
        let (ctable, log) = table_for(&count, 1);
        assert_eq!(log, 1);

        let mut dst = [0u8; 8];
        let h_size = write_table(&mut dst, &ctable, 1, log).unwrap();
        let (parsed, max_symbol, parsed_log, _) = read_table(&dst[..h_size]).unwrap();
        assert_eq!(max_symbol, 1);
        assert_eq!(parsed_log, 1);
        assert_eq!(parsed.codes[0].n_bits, 1);
        assert_eq!(parsed.codes[1].n_bits, 1);
    }
}

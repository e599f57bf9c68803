//! FSE compression of Huffman weight vectors.

use super::table::{build_compress_table, normalize_counts, optimal_table_log, write_ncount};
use super::{WEIGHT_SYMBOL_MAX, WEIGHT_TABLE_LOG};
use crate::bitstream::BitWriter;
use crate::error::{Error, Result};

/// Compress a weight vector into `dst`.
///
/// Returns `Ok(Some(len))` with the total payload size (table description
/// plus bitstream), or `Ok(None)` when FSE cannot beat the raw nibble
/// representation: the vector is trivially short, every value is identical
/// (a run the raw form already stores in one nibble each), every value is
/// unique, or the output does not fit the caller's budget.
///
/// All weights must be `<= 12`.
pub fn compress_weights(dst: &mut [u8], weights: &[u8]) -> Result<Option<usize>> {
    if weights.len() <= 1 {
        return Ok(None);
    }

    let mut count = [0u32; WEIGHT_SYMBOL_MAX as usize + 1];
    for &w in weights {
        if w > WEIGHT_SYMBOL_MAX {
            return Err(Error::Generic("weight exceeds the representable range"));
        }
        count[w as usize] += 1;
    }
    let max_symbol = (0..count.len()).rev().find(|&s| count[s] > 0).unwrap_or(0) as u8;
    let max_count = count.iter().copied().max().unwrap_or(0);
    if max_count as usize == weights.len() {
        return Ok(None); // single repeated value
    }
    if max_count == 1 {
        return Ok(None); // every value distinct: nothing to gain
    }

    let table_log = optimal_table_log(WEIGHT_TABLE_LOG, weights.len(), max_symbol, 2);
    let mut norm = vec![0i16; max_symbol as usize + 1];
    normalize_counts(&mut norm, table_log, &count, weights.len(), max_symbol)?;

    let header_size = match write_ncount(dst, &norm, max_symbol, table_log) {
        Ok(n) => n,
        Err(Error::DstTooSmall { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };

    let table = build_compress_table(&norm, table_log)?;
    let mut writer = BitWriter::new(&mut dst[header_size..]);

    // Walk the vector backward: the decoder then replays it forward, with
    // the first weight recovered from the flushed state.
    let mut state = table.first_state(weights[weights.len() - 1]);
    for &w in weights[..weights.len() - 1].iter().rev() {
        state = table.encode(state, w, &mut writer);
    }
    table.flush(state, &mut writer);

    match writer.finish() {
        Some(n) => Ok(Some(header_size + n)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_vector_declined() {
        let mut dst = [0u8; 16];
        assert!(compress_weights(&mut dst, &[3]).unwrap().is_none());
        assert!(compress_weights(&mut dst, &[]).unwrap().is_none());
    }

    #[test]
    fn test_uniform_vector_declined() {
        let mut dst = [0u8; 64];
        let weights = [4u8; 100];
        assert!(compress_weights(&mut dst, &weights).unwrap().is_none());
    }

    #[test]
    fn test_all_distinct_declined() {
        let mut dst = [0u8; 64];
        let weights = [1u8, 2, 3, 4, 5, 6];
        assert!(compress_weights(&mut dst, &weights).unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_weight_rejected() {
        let mut dst = [0u8; 64];
        let weights = [1u8, 13, 1, 1];
        assert!(compress_weights(&mut dst, &weights).is_err());
    }

    #[test]
    fn test_skewed_vector_compresses() {
        // 120 weights dominated by a couple of values: well below 60 bytes
        let mut weights = vec![1u8; 90];
        weights.extend_from_slice(&[2; 20]);
        weights.extend_from_slice(&[3; 8]);
        weights.extend_from_slice(&[5, 6]);
        let mut dst = [0u8; 128];
        let size = compress_weights(&mut dst, &weights).unwrap().unwrap();
        assert!(size > 1);
        assert!(size < weights.len() / 2, "size {size} not compressive");
    }

    #[test]
    fn test_tiny_budget_declined() {
        let mut weights = vec![1u8; 90];
        weights.extend_from_slice(&[2; 30]);
        let mut dst = [0u8; 2];
        assert!(compress_weights(&mut dst, &weights).unwrap().is_none());
    }
}

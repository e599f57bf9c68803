//! FSE decompression of Huffman weight vectors.

use super::table::{build_decode_table, read_ncount};
use super::{WEIGHT_SYMBOL_MAX, WEIGHT_TABLE_LOG};
use crate::bitstream::BitReader;
use crate::error::{Error, Result};

/// Decompress a weight vector produced by [`super::compress_weights`].
///
/// The weight count is not transmitted: the decoder emits symbols until the
/// reversed bitstream runs dry, then takes the final weight from its last
/// state. Streams describing more than 255 weights are rejected.
pub fn decompress_weights(src: &[u8]) -> Result<Vec<u8>> {
    let (norm, table_log, max_symbol, header_bytes) = read_ncount(src, WEIGHT_SYMBOL_MAX)?;
    if table_log > WEIGHT_TABLE_LOG {
        return Err(Error::corrupted("weight table accuracy log out of range"));
    }
    let table = build_decode_table(&norm[..=max_symbol as usize], table_log)?;

    let bitstream = &src[header_bytes..];
    if bitstream.is_empty() {
        return Err(Error::corrupted("missing weight bitstream"));
    }
    let mut bits = BitReader::new_reversed(bitstream)?;
    let mut state = bits.read_bits(table_log as usize)? as usize;

    let mut weights = Vec::with_capacity(64);
    loop {
        let entry = table.entry(state);
        weights.push(entry.symbol);
        if weights.len() > 255 {
            return Err(Error::corrupted("oversized weight stream"));
        }
        let nb = entry.num_bits as usize;
        if nb == 0 || bits.bits_remaining() < nb {
            break;
        }
        let add = bits.read_bits(nb)?;
        state = entry.baseline as usize + add as usize;
    }
    if bits.bits_remaining() != 0 {
        return Err(Error::corrupted("trailing bits in weight stream"));
    }

    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::super::compress_weights;
    use super::*;

    fn roundtrip(weights: &[u8]) {
        let mut dst = [0u8; 256];
        let size = compress_weights(&mut dst, weights)
            .unwrap()
            .expect("vector should be compressible");
        let decoded = decompress_weights(&dst[..size]).unwrap();
        assert_eq!(decoded, weights);
    }

    #[test]
    fn test_roundtrip_skewed() {
        let mut weights = vec![1u8; 80];
        weights.extend_from_slice(&[2; 30]);
        weights.extend_from_slice(&[3; 10]);
        weights.extend_from_slice(&[4, 4, 5, 6]);
        roundtrip(&weights);
    }

    #[test]
    fn test_roundtrip_two_values() {
        let mut weights = vec![1u8; 60];
        weights.extend_from_slice(&[2; 40]);
        roundtrip(&weights);
    }

    #[test]
    fn test_roundtrip_with_zeros() {
        // absent symbols inside the vector, as real weight tables have
        let mut weights = Vec::new();
        for i in 0..120u8 {
            weights.push(match i % 5 {
                0 | 1 => 1,
                2 => 2,
                3 => 0,
                _ => 3,
            });
        }
        roundtrip(&weights);
    }

    #[test]
    fn test_roundtrip_dominant_value() {
        // heavy skew exercises the half-table cap
        let mut weights = vec![1u8; 118];
        weights.push(2);
        weights.push(3);
        roundtrip(&weights);
    }

    #[test]
    fn test_roundtrip_odd_and_even_lengths() {
        for len in [7usize, 8, 33, 100, 101] {
            let mut weights = Vec::with_capacity(len);
            for i in 0..len {
                weights.push(if i % 3 == 0 { 2 } else { 1 });
            }
            roundtrip(&weights);
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(decompress_weights(&[]).is_err());
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let mut weights = vec![1u8; 80];
        weights.extend_from_slice(&[2; 40]);
        let mut dst = [0u8; 256];
        let size = compress_weights(&mut dst, &weights).unwrap().unwrap();
        // drop the final byte: the sentinel disappears with it
        let result = decompress_weights(&dst[..size - 1]);
        if let Ok(decoded) = result {
            assert_ne!(decoded, weights);
        }
    }
}

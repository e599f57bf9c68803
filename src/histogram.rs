//! Symbol frequency counting.
//!
//! The histogram feeds every decision the block compressor makes: the RLE
//! and flatness shortcuts, table construction, and the reuse cost estimate.

use crate::error::{Error, Result};
use crate::huffman::MAX_SYMBOLS;

/// Exact per-symbol occurrence counts for `src`.
///
/// `count` is filled for symbols `0..=max_symbol`; the returned pair is
/// `(largest, trimmed_max)` where `largest` is the highest single count and
/// `trimmed_max` the largest symbol value actually present (0 for empty
/// input). A symbol above `max_symbol` is an error: the caller declared an
/// alphabet bound the data does not respect.
///
/// Counting uses four interleaved accumulators to reduce same-address
/// increment stalls on repetitive data.
pub fn count_with_limit(
    count: &mut [u32; MAX_SYMBOLS],
    src: &[u8],
    max_symbol: u8,
) -> Result<(u32, u8)> {
    let mut freq1 = [0u32; MAX_SYMBOLS];
    let mut freq2 = [0u32; MAX_SYMBOLS];
    let mut freq3 = [0u32; MAX_SYMBOLS];
    count.fill(0);

    let mut chunks = src.chunks_exact(4);
    for chunk in &mut chunks {
        count[chunk[0] as usize] += 1;
        freq1[chunk[1] as usize] += 1;
        freq2[chunk[2] as usize] += 1;
        freq3[chunk[3] as usize] += 1;
    }
    for &byte in chunks.remainder() {
        count[byte as usize] += 1;
    }
    for s in 0..MAX_SYMBOLS {
        count[s] += freq1[s] + freq2[s] + freq3[s];
    }

    let mut largest = 0u32;
    let mut trimmed_max = 0usize;
    for (s, &c) in count.iter().enumerate() {
        if c == 0 {
            continue;
        }
        if s > max_symbol as usize {
            return Err(Error::MaxSymbolTooLarge {
                value: s as u32,
                max: max_symbol as u32,
            });
        }
        largest = largest.max(c);
        trimmed_max = s;
    }

    Ok((largest, trimmed_max as u8))
}

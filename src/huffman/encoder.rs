//! Block compression: stream encoding and orchestration.
//!
//! `compress_internal` is the single pipeline behind every public entry
//! point: histogram, shortcut heuristics, previous-table validation and
//! reuse, table build, header serialization, and stream emission, in that
//! order. The 1-stream and 4-stream variants differ only in how the payload
//! is laid out.

use self::CompressOutcome::{Compressed, Rle, Uncompressible};
use super::{
    build_ctable, estimate_compressed_size, optimal_table_log, validate_ctable, write_table,
    CTable, Repeat, Workspace, BLOCK_SIZE_MAX, SYMBOL_MAX, TABLE_LOG_DEFAULT, TABLE_LOG_MAX,
};
use crate::bitstream::BitWriter;
use crate::error::{Error, Result};
use crate::histogram;
use tracing::debug;

/// Result of compressing a block.
///
/// `Uncompressible` tells the caller to store the block raw; `Rle` means the
/// block is a single repeated byte, already written as one output byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressOutcome {
    /// Entropy coding does not pay for this block; store it uncompressed.
    Uncompressible,
    /// Every byte is identical; the one output byte is the symbol.
    Rle,
    /// Compressed payload of this many bytes (header included, if any).
    Compressed(usize),
}

/// Payload layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Streams {
    Single,
    Four,
}

/// Compress a block into a single stream, building a fresh table.
pub fn compress_1x(
    dst: &mut [u8],
    src: &[u8],
    max_symbol_value: u8,
    table_log: u8,
    workspace: &mut Workspace,
) -> Result<CompressOutcome> {
    compress_internal(dst, src, max_symbol_value, table_log, Streams::Single, workspace, None, false)
}

/// Compress a block into a single stream, reusing `prev_table` when the
/// heuristics favor it.
///
/// With `prefer_repeat` set and `*repeat == Repeat::Valid`, the previous
/// table is used without revalidation — the caller asserts it covers every
/// symbol of `src`. A symbol outside the table makes the output undecodable.
#[allow(clippy::too_many_arguments)]
pub fn compress_1x_repeat(
    dst: &mut [u8],
    src: &[u8],
    max_symbol_value: u8,
    table_log: u8,
    workspace: &mut Workspace,
    prev_table: &mut CTable,
    repeat: &mut Repeat,
    prefer_repeat: bool,
) -> Result<CompressOutcome> {
    compress_internal(
        dst,
        src,
        max_symbol_value,
        table_log,
        Streams::Single,
        workspace,
        Some((prev_table, repeat)),
        prefer_repeat,
    )
}

/// Compress a block into four streams behind a 6-byte jump table.
pub fn compress_4x(
    dst: &mut [u8],
    src: &[u8],
    max_symbol_value: u8,
    table_log: u8,
    workspace: &mut Workspace,
) -> Result<CompressOutcome> {
    compress_internal(dst, src, max_symbol_value, table_log, Streams::Four, workspace, None, false)
}

/// Four-stream variant of [`compress_1x_repeat`]; the same reuse contract
/// applies.
#[allow(clippy::too_many_arguments)]
pub fn compress_4x_repeat(
    dst: &mut [u8],
    src: &[u8],
    max_symbol_value: u8,
    table_log: u8,
    workspace: &mut Workspace,
    prev_table: &mut CTable,
    repeat: &mut Repeat,
    prefer_repeat: bool,
) -> Result<CompressOutcome> {
    compress_internal(
        dst,
        src,
        max_symbol_value,
        table_log,
        Streams::Four,
        workspace,
        Some((prev_table, repeat)),
        prefer_repeat,
    )
}

#[allow(clippy::too_many_arguments)]
fn compress_internal(
    dst: &mut [u8],
    src: &[u8],
    max_symbol_value: u8,
    table_log: u8,
    streams: Streams,
    workspace: &mut Workspace,
    mut prev: Option<(&mut CTable, &mut Repeat)>,
    prefer_repeat: bool,
) -> Result<CompressOutcome> {
    let src_size = src.len();
    if src_size == 0 {
        return Ok(Uncompressible);
    }
    if dst.is_empty() {
        return Ok(Uncompressible);
    }
    if src_size > BLOCK_SIZE_MAX {
        return Err(Error::SrcTooLarge {
            size: src_size,
            max: BLOCK_SIZE_MAX,
        });
    }
    if table_log > TABLE_LOG_MAX {
        return Err(Error::TableLogTooLarge {
            value: table_log as u32,
            max: TABLE_LOG_MAX as u32,
        });
    }
    let max_symbol_value = if max_symbol_value == 0 {
        SYMBOL_MAX
    } else {
        max_symbol_value
    };
    let table_log = if table_log == 0 {
        TABLE_LOG_DEFAULT
    } else {
        table_log
    };

    // known-valid previous table: skip the histogram entirely
    if prefer_repeat {
        if let Some((old_table, repeat)) = prev.as_mut() {
            if **repeat == Repeat::Valid {
                return Ok(compress_with_table(dst, src, 0, old_table, streams));
            }
        }
    }

    let (largest, max_symbol) =
        histogram::count_with_limit(&mut workspace.count, src, max_symbol_value)?;
    if largest as usize == src_size {
        dst[0] = src[0];
        return Ok(Rle);
    }
    if largest as usize <= (src_size >> 7) + 1 {
        // too flat to recoup the header
        return Ok(Uncompressible);
    }

    if let Some((old_table, repeat)) = prev.as_mut() {
        if **repeat == Repeat::Check && !validate_ctable(old_table, &workspace.count, max_symbol) {
            **repeat = Repeat::None;
        }
        if prefer_repeat && **repeat != Repeat::None {
            return Ok(compress_with_table(dst, src, 0, old_table, streams));
        }
    }

    let table_log = optimal_table_log(table_log, src_size, max_symbol);
    let table_log = {
        let Workspace { count, ctable, nodes } = &mut *workspace;
        build_ctable(ctable, count, max_symbol, table_log, nodes)?
    };

    let h_size = write_table(dst, &workspace.ctable, max_symbol, table_log)?;

    // would the previously transmitted table beat a fresh header + payload?
    if let Some((old_table, repeat)) = prev.as_mut() {
        if **repeat != Repeat::None {
            let old_size = estimate_compressed_size(old_table, &workspace.count, max_symbol);
            let new_size = estimate_compressed_size(&workspace.ctable, &workspace.count, max_symbol);
            if old_size <= h_size + new_size || h_size + 12 >= src_size {
                debug!(old_size, new_size, h_size, "reusing previous table");
                return Ok(compress_with_table(dst, src, 0, old_table, streams));
            }
        }
    }

    if h_size + 12 >= src_size {
        debug!(h_size, src_size, "table header defeats compression");
        return Ok(Uncompressible);
    }

    if let Some((old_table, repeat)) = prev.as_mut() {
        **repeat = Repeat::None;
        **old_table = workspace.ctable.clone();
    }
    Ok(compress_with_table(dst, src, h_size, &workspace.ctable, streams))
}

/// Emit the payload after `offset` header bytes and apply the final
/// compressibility test.
fn compress_with_table(
    dst: &mut [u8],
    src: &[u8],
    offset: usize,
    ctable: &CTable,
    streams: Streams,
) -> CompressOutcome {
    let c_size = match streams {
        Streams::Single => encode_1x(&mut dst[offset..], src, ctable),
        Streams::Four => encode_4x(&mut dst[offset..], src, ctable),
    };
    if c_size == 0 {
        return Uncompressible;
    }
    let total = offset + c_size;
    if total >= src.len() - 1 {
        return Uncompressible;
    }
    Compressed(total)
}

/// Encode `src` as one stream. Returns 0 when the destination cannot hold
/// the stream.
///
/// The input is walked back to front so the decoder, reading from the
/// sentinel backward, emits symbols in forward order.
fn encode_1x(dst: &mut [u8], src: &[u8], ctable: &CTable) -> usize {
    if dst.len() < 8 {
        return 0;
    }
    let mut writer = BitWriter::new(dst);
    for &byte in src.iter().rev() {
        let code = ctable.codes[byte as usize];
        writer.add_bits(code.value as u32, code.n_bits);
    }
    writer.finish().unwrap_or(0)
}

/// Encode `src` as four independent streams over input quarters, prefixed
/// with three little-endian u16 stream lengths. Returns 0 when the input is
/// too small or any stream does not fit.
fn encode_4x(dst: &mut [u8], src: &[u8], ctable: &CTable) -> usize {
    if src.len() < 12 {
        return 0;
    }
    if dst.len() < 6 + 3 + 8 {
        return 0;
    }

    let segment_size = src.len().div_ceil(4);
    let mut lengths = [0u16; 3];
    let mut pos = 6;
    let mut start = 0;
    for i in 0..4 {
        let end = if i == 3 {
            src.len()
        } else {
            start + segment_size
        };
        let n = encode_1x(&mut dst[pos..], &src[start..end], ctable);
        if n == 0 {
            return 0;
        }
        if i < 3 {
            if n > u16::MAX as usize {
                return 0;
            }
            lengths[i] = n as u16;
        }
        pos += n;
        start = end;
    }
    dst[0..2].copy_from_slice(&lengths[0].to_le_bytes());
    dst[2..4].copy_from_slice(&lengths[1].to_le_bytes());
    dst[4..6].copy_from_slice(&lengths[2].to_le_bytes());
    pos
}

// =============================================================================
// Tests
// =============================================================================

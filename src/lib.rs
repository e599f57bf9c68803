//! # Stolas
//!
//! Length-limited canonical Huffman block compression with FSE-coded table
//! headers — the final entropy stage of a general-purpose compressor,
//! usable on its own.
//!
//! Stolas is named after the 36th prince of the Ars Goetia, a great owl who
//! teaches astronomy and the knowledge of precious stones; an apt patron
//! for a library whose whole craft is counting symbols and setting them in
//! their most compact arrangement.
//!
//! ## What it does
//!
//! Given a block of bytes (up to 128 KiB), the compressor builds an optimal
//! prefix code, repairs it so no codeword exceeds a caller-supplied bound
//! (11 by default, 12 at most), serializes the code table compactly, and
//! emits the block as one or four entropy-coded streams:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        stolas                             │
//! ├───────────────────────────────────────────────────────────┤
//! │  huffman/            │  fse/                              │
//! │  ├── builder.rs      │  ├── table.rs                      │
//! │  │   sort → tree →   │  │   normalize, NCount,            │
//! │  │   limit → assign  │  │   encode/decode tables          │
//! │  ├── table.rs        │  ├── encoder.rs (weight vectors)   │
//! │  ├── encoder.rs      │  └── decoder.rs                    │
//! │  └── decoder.rs      │                                    │
//! ├───────────────────────────────────────────────────────────┤
//! │  histogram.rs        │  bitstream.rs                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The code table travels as a weight vector: a symbol coded in `len` bits
//! has weight `table_log + 1 - len`, weights pack two to a byte, and a
//! small FSE coder compresses the vector when that wins. Across a sequence
//! of blocks the previous table can be reused, skipping the header
//! entirely when an estimate says the old code is close enough.
//!
//! ## Example
//!
//! ```
//! use stolas::huffman::{self, CompressOutcome, Workspace};
//!
//! let src = b"a reasonably repetitive message, repeated a few times over; "
//!     .repeat(32);
//! let mut dst = vec![0u8; huffman::compress_bound(src.len())];
//! let mut workspace = Workspace::new();
//!
//! match huffman::compress_4x(&mut dst, &src, 255, 11, &mut workspace)? {
//!     CompressOutcome::Compressed(len) => {
//!         let mut out = vec![0u8; src.len()];
//!         huffman::decompress_4x(&mut out, &dst[..len])?;
//!         assert_eq!(out, src);
//!     }
//!     CompressOutcome::Rle => { /* store the single byte */ }
//!     CompressOutcome::Uncompressible => { /* store the block raw */ }
//! }
//! # Ok::<(), stolas::Error>(())
//! ```
//!
//! ## Guarantees
//!
//! - Codes are canonical and exactly Kraft-complete; every emitted length
//!   is at most the requested bound.
//! - Compression never allocates on the hot path: the caller owns the
//!   destination buffer and a reusable [`huffman::Workspace`].
//! - Every operation either succeeds, reports the block uncompressible (or
//!   a single-byte RLE case), or fails with a tagged [`Error`] — no partial
//!   state survives a failure.
//!
//! Blocks are not self-describing: the caller records each block's
//! regenerated size and stream count, the way an outer frame format would.

pub mod bitstream;
pub mod error;
pub mod fse;
pub mod histogram;
pub mod huffman;

pub use error::{Error, Result};

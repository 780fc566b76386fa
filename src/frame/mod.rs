//! The frame layer: the single source of truth for the columnar body's
//! on-wire structures.
//!
//! A columnar body is one line-presence frame followed by zero or more
//! shape frames, each self-delimiting, separated by a single `\n` byte
//! the reader tolerates and skips. All multi-byte integers are
//! little-endian.
//!
//! Line-presence frame: `'B' 'M' || u32 line_count || ceil(line_count/8)
//! bitmap bytes`. Exactly one per container, always first; `0` bits are
//! restored as empty lines.
//!
//! Shape frame: `0xC1 || u32 rows || u64 shape_id || u16 key_count ||
//! (u32 key_len || key bytes) * key_count || presence bitmap ||
//! (u32 column_len || column bytes) * key_count`.

pub mod reader;
pub mod writer;

/// Leading bytes of the line-presence frame.
pub const LINE_PRESENCE_MAGIC: [u8; 2] = *b"BM";
/// Leading byte of a shape frame.
pub const SHAPE_FRAME_MAGIC: u8 = 0xC1;
/// Separator byte inserted between frames by the front-end.
pub const FRAME_SEPARATOR: u8 = b'\n';
/// Upper bound on rows per shape frame.
pub const MAX_ROWS_PER_FRAME: usize = 4096;

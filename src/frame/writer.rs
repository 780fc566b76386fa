//! Serialisation of line-presence and shape frames.
//!
//! A frame is materialised in memory once, serialised to a byte run, and
//! never mutated. The writer owns the layout; every length it emits is
//! the length the reader walks by.

use crate::error::JcoError;
use crate::kernels::bitmap::Bitmap;

use super::{LINE_PRESENCE_MAGIC, SHAPE_FRAME_MAGIC};

/// Serialises the global line-presence frame.
pub fn write_line_presence_frame(lines: &Bitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + 4 + lines.byte_len());
    out.extend_from_slice(&LINE_PRESENCE_MAGIC);
    out.extend_from_slice(&(lines.len() as u32).to_le_bytes());
    out.extend_from_slice(lines.as_bytes());
    out
}

/// Serialises one shape frame. `columns` holds one encoded column
/// (tag byte plus payload) per key, in key order.
pub fn write_shape_frame(
    shape_id: u64,
    keys: &[String],
    rows: usize,
    presence: &Bitmap,
    columns: &[Vec<u8>],
) -> Result<Vec<u8>, JcoError> {
    if keys.len() > u16::MAX as usize {
        return Err(JcoError::Internal(format!(
            "shape frame cannot carry {} keys",
            keys.len()
        )));
    }
    if columns.len() != keys.len() {
        return Err(JcoError::Internal(format!(
            "shape frame has {} keys but {} columns",
            keys.len(),
            columns.len()
        )));
    }
    if presence.len() != rows * keys.len() {
        return Err(JcoError::Internal(format!(
            "presence bitmap has {} bits for {} rows x {} keys",
            presence.len(),
            rows,
            keys.len()
        )));
    }

    let mut out = Vec::new();
    out.push(SHAPE_FRAME_MAGIC);
    out.extend_from_slice(&(rows as u32).to_le_bytes());
    out.extend_from_slice(&shape_id.to_le_bytes());
    out.extend_from_slice(&(keys.len() as u16).to_le_bytes());
    for key in keys {
        out.extend_from_slice(&(key.len() as u32).to_le_bytes());
        out.extend_from_slice(key.as_bytes());
    }
    out.extend_from_slice(presence.as_bytes());
    for column in columns {
        out.extend_from_slice(&(column.len() as u32).to_le_bytes());
        out.extend_from_slice(column);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_presence_layout() {
        let mut lines = Bitmap::new(3);
        lines.set(0, true);
        lines.set(2, true);
        let bytes = write_line_presence_frame(&lines);
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(u32::from_le_bytes(bytes[2..6].try_into().unwrap()), 3);
        assert_eq!(&bytes[6..], &[0b0000_0101]);
    }

    #[test]
    fn test_shape_frame_layout_zero_keys() {
        // A record with no keys still produces a well-formed frame.
        let presence = Bitmap::new(0);
        let bytes = write_shape_frame(0xDEAD, &[], 2, &presence, &[]).unwrap();
        assert_eq!(bytes[0], SHAPE_FRAME_MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[1..5].try_into().unwrap()), 2);
        assert_eq!(u64::from_le_bytes(bytes[5..13].try_into().unwrap()), 0xDEAD);
        assert_eq!(u16::from_le_bytes(bytes[13..15].try_into().unwrap()), 0);
        assert_eq!(bytes.len(), 15);
    }

    #[test]
    fn test_shape_frame_rejects_mismatched_presence() {
        let presence = Bitmap::new(3);
        let err = write_shape_frame(1, &["a".to_string()], 2, &presence, &[vec![6]]);
        assert!(err.is_err());
    }
}

//! Frame parsing.
//!
//! A reader walks the body without an external index: it parses each
//! frame header and skips by the declared lengths. Column payloads are
//! returned as ranges into the input so the selective decoder can skip
//! columns it was not asked for without touching their bytes.

use std::ops::Range;

use crate::error::JcoError;
use crate::kernels::bitmap::Bitmap;

use super::{FRAME_SEPARATOR, LINE_PRESENCE_MAGIC, SHAPE_FRAME_MAGIC};

/// The parsed line-presence frame.
#[derive(Debug)]
pub struct LinePresenceFrame {
    /// One bit per input line; 1 = a JSON record, 0 = a blank position.
    pub lines: Bitmap,
    /// Bytes this frame occupied in the input.
    pub consumed: usize,
}

/// A parsed shape frame header with column payload ranges.
#[derive(Debug)]
pub struct ShapeFrame {
    pub shape_id: u64,
    pub rows: usize,
    pub keys: Vec<String>,
    /// Row-major presence bits, index `row * keys.len() + k`.
    pub presence: Bitmap,
    /// One range per key into the slice the frame was parsed from, each
    /// covering `type_tag || payload`.
    pub columns: Vec<Range<usize>>,
    /// Bytes this frame occupied in the input.
    pub consumed: usize,
}

fn truncated(what: &str) -> JcoError {
    JcoError::FrameCorrupt(format!("truncated frame: {}", what))
}

fn read_u32(input: &[u8], offset: &mut usize, what: &str) -> Result<u32, JcoError> {
    let bytes = input
        .get(*offset..*offset + 4)
        .ok_or_else(|| truncated(what))?;
    *offset += 4;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

/// Parses the line-presence frame at the start of `input`.
pub fn parse_line_presence(input: &[u8]) -> Result<LinePresenceFrame, JcoError> {
    if input.get(..2) != Some(&LINE_PRESENCE_MAGIC[..]) {
        return Err(JcoError::FrameCorrupt(
            "missing line-presence frame magic".to_string(),
        ));
    }
    let mut offset = 2;
    let line_count = read_u32(input, &mut offset, "line count")? as usize;
    let byte_len = (line_count + 7) / 8;
    let bits = input
        .get(offset..offset + byte_len)
        .ok_or_else(|| truncated("line-presence bitmap"))?;
    offset += byte_len;
    Ok(LinePresenceFrame {
        lines: Bitmap::from_bytes(bits, line_count)?,
        consumed: offset,
    })
}

/// Parses one shape frame at the start of `input`.
pub fn parse_shape_frame(input: &[u8]) -> Result<ShapeFrame, JcoError> {
    if input.first() != Some(&SHAPE_FRAME_MAGIC) {
        return Err(JcoError::FrameCorrupt("bad shape frame magic".to_string()));
    }
    let mut offset = 1;
    let rows = read_u32(input, &mut offset, "row count")? as usize;
    let shape_id_bytes = input
        .get(offset..offset + 8)
        .ok_or_else(|| truncated("shape id"))?;
    let shape_id = u64::from_le_bytes(shape_id_bytes.try_into().unwrap());
    offset += 8;
    let key_count_bytes = input
        .get(offset..offset + 2)
        .ok_or_else(|| truncated("key count"))?;
    let key_count = u16::from_le_bytes(key_count_bytes.try_into().unwrap()) as usize;
    offset += 2;

    let mut keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let len = read_u32(input, &mut offset, "key length")? as usize;
        let bytes = input
            .get(offset..offset + len)
            .ok_or_else(|| truncated("key bytes"))?;
        let key = std::str::from_utf8(bytes)
            .map_err(|_| JcoError::FrameCorrupt("frame key is not UTF-8".to_string()))?
            .to_string();
        keys.push(key);
        offset += len;
    }

    let presence_bits = rows
        .checked_mul(key_count)
        .ok_or_else(|| JcoError::FrameCorrupt("presence bitmap size overflow".to_string()))?;
    let presence_bytes = (presence_bits + 7) / 8;
    let bits = input
        .get(offset..offset + presence_bytes)
        .ok_or_else(|| truncated("presence bitmap"))?;
    let presence = Bitmap::from_bytes(bits, presence_bits)?;
    offset += presence_bytes;

    let mut columns = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let len = read_u32(input, &mut offset, "column length")? as usize;
        if input.get(offset..offset + len).is_none() {
            return Err(truncated("column payload"));
        }
        columns.push(offset..offset + len);
        offset += len;
    }

    Ok(ShapeFrame {
        shape_id,
        rows,
        keys,
        presence,
        columns,
        consumed: offset,
    })
}

/// Walks every frame in a columnar body. Returns the line-presence frame
/// and the shape frames in body order. Column ranges are rebased onto the
/// body slice, so `&body[range]` is a column's `tag || payload` bytes.
pub fn parse_body(body: &[u8]) -> Result<(LinePresenceFrame, Vec<ShapeFrame>), JcoError> {
    let line_presence = parse_line_presence(body)?;
    let mut offset = line_presence.consumed;
    let mut shape_frames = Vec::new();
    while offset < body.len() {
        if body[offset] == FRAME_SEPARATOR {
            offset += 1;
            continue;
        }
        let mut frame = parse_shape_frame(&body[offset..])?;
        for range in &mut frame.columns {
            *range = range.start + offset..range.end + offset;
        }
        offset += frame.consumed;
        shape_frames.push(frame);
    }
    Ok((line_presence, shape_frames))
}

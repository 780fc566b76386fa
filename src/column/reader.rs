//! Typed column readers.
//!
//! Each wire tag has one concrete reader. A reader is opened once per
//! column, fully parsing the payload at that point, and per-row access
//! is an index, so type dispatch happens once per column rather than once
//! per row.

use std::io::Cursor;

use serde_json::Value;

use crate::error::JcoError;
use crate::kernels::{leb128, zigzag};

use super::{ColumnType, ENUM_NULL_ID};

/// Uniform access to a decoded column. `value_at` returns `None` for a
/// null cell; the caller combines that with the frame's presence bitmap to
/// tell JSON `null` from an absent key.
pub trait ColumnReader: std::fmt::Debug {
    fn is_present(&self, row: usize) -> bool;
    fn value_at(&self, row: usize) -> Option<Value>;
}

/// Opens the reader for a column payload. `tag` is the leading type byte,
/// `payload` the remaining column bytes, `rows` the frame's row count.
pub fn open_reader(
    tag: u8,
    payload: &[u8],
    rows: usize,
) -> Result<Box<dyn ColumnReader>, JcoError> {
    match ColumnType::from_tag(tag)? {
        ColumnType::IntVarint => Ok(Box::new(IntReader {
            values: decode_int_varint(payload, rows)?,
        })),
        ColumnType::DeltaZigzag => Ok(Box::new(IntReader {
            values: decode_delta_zigzag(payload, rows)?,
        })),
        ColumnType::TimeDod => Ok(Box::new(IntReader {
            values: decode_time_dod(payload, rows)?,
        })),
        ColumnType::BoolRle => Ok(Box::new(BoolReader {
            values: decode_bool_rle(payload, rows)?,
        })),
        ColumnType::EnumIds => Ok(Box::new(decode_enum_ids(payload, rows)?)),
        ColumnType::RawJson => Ok(Box::new(RawJsonReader {
            values: decode_raw_json(payload, rows)?,
        })),
    }
}

//==================================================================================
// 1. Concrete readers
//==================================================================================

#[derive(Debug)]
struct IntReader {
    values: Vec<Option<i64>>,
}

impl ColumnReader for IntReader {
    fn is_present(&self, row: usize) -> bool {
        self.values.get(row).map_or(false, Option::is_some)
    }
    fn value_at(&self, row: usize) -> Option<Value> {
        self.values.get(row).copied().flatten().map(Value::from)
    }
}

#[derive(Debug)]
struct BoolReader {
    values: Vec<Option<bool>>,
}

impl ColumnReader for BoolReader {
    fn is_present(&self, row: usize) -> bool {
        self.values.get(row).map_or(false, Option::is_some)
    }
    fn value_at(&self, row: usize) -> Option<Value> {
        self.values.get(row).copied().flatten().map(Value::from)
    }
}

#[derive(Debug)]
struct EnumReader {
    dict: Vec<String>,
    ids: Vec<u8>,
}

impl ColumnReader for EnumReader {
    fn is_present(&self, row: usize) -> bool {
        self.ids.get(row).map_or(false, |&id| id != ENUM_NULL_ID)
    }
    fn value_at(&self, row: usize) -> Option<Value> {
        let &id = self.ids.get(row)?;
        if id == ENUM_NULL_ID {
            return None;
        }
        self.dict.get(id as usize).map(|s| Value::String(s.clone()))
    }
}

#[derive(Debug)]
struct RawJsonReader {
    values: Vec<Option<Value>>,
}

impl ColumnReader for RawJsonReader {
    fn is_present(&self, row: usize) -> bool {
        self.values.get(row).map_or(false, Option::is_some)
    }
    fn value_at(&self, row: usize) -> Option<Value> {
        self.values.get(row).cloned().flatten()
    }
}

//==================================================================================
// 2. Payload decoders
//==================================================================================

fn expect_consumed(cursor: &Cursor<&[u8]>, what: &str) -> Result<(), JcoError> {
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if remaining != 0 {
        return Err(JcoError::FrameCorrupt(format!(
            "{} payload has {} trailing bytes",
            what, remaining
        )));
    }
    Ok(())
}

fn decode_int_varint(payload: &[u8], rows: usize) -> Result<Vec<Option<i64>>, JcoError> {
    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(rows);
    for _ in 0..rows {
        let wire = leb128::decode_one::<u64>(&mut cursor)?;
        values.push(zigzag::decode_opt(wire));
    }
    expect_consumed(&cursor, "INT_VARINT")?;
    Ok(values)
}

fn decode_delta_zigzag(payload: &[u8], rows: usize) -> Result<Vec<Option<i64>>, JcoError> {
    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(rows);
    let mut prev: i64 = 0;
    for _ in 0..rows {
        let wire = leb128::decode_one::<u64>(&mut cursor)?;
        match zigzag::decode_opt(wire) {
            Some(delta) => {
                let v = prev.wrapping_add(delta);
                prev = v;
                values.push(Some(v));
            }
            None => values.push(None),
        }
    }
    expect_consumed(&cursor, "DELTA_ZIGZAG")?;
    Ok(values)
}

fn decode_time_dod(payload: &[u8], rows: usize) -> Result<Vec<Option<i64>>, JcoError> {
    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(rows);
    let mut prev: i64 = 0;
    let mut prev_delta: i64 = 0;
    let mut seen: usize = 0;
    for _ in 0..rows {
        let wire = leb128::decode_one::<u64>(&mut cursor)?;
        match zigzag::decode_opt(wire) {
            Some(decoded) => {
                let v = match seen {
                    0 => decoded,
                    1 => {
                        prev_delta = decoded;
                        prev.wrapping_add(decoded)
                    }
                    _ => {
                        prev_delta = prev_delta.wrapping_add(decoded);
                        prev.wrapping_add(prev_delta)
                    }
                };
                prev = v;
                seen += 1;
                values.push(Some(v));
            }
            None => values.push(None),
        }
    }
    expect_consumed(&cursor, "TIME_DOD")?;
    Ok(values)
}

fn decode_bool_rle(payload: &[u8], rows: usize) -> Result<Vec<Option<bool>>, JcoError> {
    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(rows);
    while values.len() < rows {
        let pos = cursor.position() as usize;
        let code = match cursor.get_ref().get(pos) {
            Some(&c) => c,
            // A short stream pads out with nulls.
            None => {
                values.resize(rows, None);
                break;
            }
        };
        cursor.set_position((pos + 1) as u64);
        let run = leb128::decode_one::<u32>(&mut cursor)? as usize;
        let value = match code {
            0 => None,
            1 => Some(false),
            2 => Some(true),
            other => {
                return Err(JcoError::FrameCorrupt(format!(
                    "BOOL_RLE value code out of range: {}",
                    other
                )))
            }
        };
        // Stop at the row count; trailing run length past it is ignored.
        let take = run.min(rows - values.len());
        values.extend(std::iter::repeat(value).take(take));
    }
    Ok(values)
}

fn decode_enum_ids(payload: &[u8], rows: usize) -> Result<EnumReader, JcoError> {
    let mut cursor = Cursor::new(payload);
    let pos = cursor.position() as usize;
    let dict_count = *cursor.get_ref().get(pos).ok_or_else(|| {
        JcoError::FrameCorrupt("ENUM_IDS payload missing dictionary count".to_string())
    })? as usize;
    cursor.set_position((pos + 1) as u64);

    let mut dict = Vec::with_capacity(dict_count);
    for _ in 0..dict_count {
        let len = leb128::decode_one::<u32>(&mut cursor)? as usize;
        let start = cursor.position() as usize;
        let bytes = cursor.get_ref().get(start..start + len).ok_or_else(|| {
            JcoError::FrameCorrupt("ENUM_IDS dictionary entry truncated".to_string())
        })?;
        let entry = std::str::from_utf8(bytes)
            .map_err(|_| JcoError::FrameCorrupt("ENUM_IDS dictionary entry not UTF-8".to_string()))?
            .to_string();
        dict.push(entry);
        cursor.set_position((start + len) as u64);
    }

    let start = cursor.position() as usize;
    let ids = cursor
        .get_ref()
        .get(start..start + rows)
        .ok_or_else(|| JcoError::FrameCorrupt("ENUM_IDS id stream truncated".to_string()))?
        .to_vec();
    if start + rows != payload.len() {
        return Err(JcoError::FrameCorrupt(
            "ENUM_IDS payload has trailing bytes".to_string(),
        ));
    }
    for &id in &ids {
        if id != ENUM_NULL_ID && id as usize >= dict.len() {
            return Err(JcoError::FrameCorrupt(format!(
                "ENUM_IDS id {} out of range for dictionary of {}",
                id,
                dict.len()
            )));
        }
    }
    Ok(EnumReader { dict, ids })
}

fn decode_raw_json(payload: &[u8], rows: usize) -> Result<Vec<Option<Value>>, JcoError> {
    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(rows);
    for _ in 0..rows {
        let len = leb128::decode_one::<u32>(&mut cursor)? as usize;
        let start = cursor.position() as usize;
        let bytes = cursor
            .get_ref()
            .get(start..start + len)
            .ok_or_else(|| JcoError::FrameCorrupt("RAW_JSON element truncated".to_string()))?;
        cursor.set_position((start + len) as u64);
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| JcoError::FrameCorrupt(format!("RAW_JSON element invalid: {}", e)))?;
        values.push(if value.is_null() { None } else { Some(value) });
    }
    expect_consumed(&cursor, "RAW_JSON")?;
    Ok(values)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

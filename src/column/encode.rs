//! The column payload writers.
//!
//! `encode_column` runs the planner, writes the selected tag byte, and
//! serialises the payload. All integer payloads go through the
//! null-sentinel zig-zag mapping (wire value 0 is "null in this row") so
//! every non-null integer encodes as a non-zero varint.

use crate::error::JcoError;
use crate::kernels::{leb128, zigzag};

use super::plan::{as_int53, select_column_type, Cell};
use super::{ColumnType, ENUM_NULL_ID};

/// Encodes one column into `type_tag:u8 || payload` bytes.
pub fn encode_column(cells: &[Cell<'_>]) -> Result<Vec<u8>, JcoError> {
    let (column_type, enum_dict) = select_column_type(cells);
    let mut out = Vec::with_capacity(cells.len() * 2 + 1);
    out.push(column_type.tag());

    match column_type {
        ColumnType::IntVarint => write_int_varint(cells, &mut out),
        ColumnType::DeltaZigzag => write_delta_zigzag(cells, &mut out),
        ColumnType::TimeDod => write_time_dod(cells, &mut out),
        ColumnType::BoolRle => write_bool_rle(cells, &mut out),
        ColumnType::EnumIds => {
            let dict = enum_dict.ok_or_else(|| {
                JcoError::Internal("planner selected ENUM_IDS without a dictionary".to_string())
            })?;
            write_enum_ids(cells, &dict, &mut out)?;
        }
        ColumnType::RawJson => write_raw_json(cells, &mut out),
    }
    Ok(out)
}

/// One varint per row: `zigzag(value) + 1`, or 0 for a null cell.
fn write_int_varint(cells: &[Cell<'_>], out: &mut Vec<u8>) {
    for cell in cells {
        let value = cell.and_then(as_int53);
        leb128::encode_one(zigzag::encode_opt(value), out);
    }
}

/// Row 0 carries the absolute value; later rows carry the delta against
/// the previous non-null value. Null rows write 0 and leave the state
/// untouched.
fn write_delta_zigzag(cells: &[Cell<'_>], out: &mut Vec<u8>) {
    let mut prev: i64 = 0;
    for cell in cells {
        match cell.and_then(as_int53) {
            Some(v) => {
                leb128::encode_one(zigzag::encode_opt(Some(v - prev)), out);
                prev = v;
            }
            None => leb128::encode_one(0u64, out),
        }
    }
}

/// Delta-of-delta: row 0 absolute, the next non-null row a first-order
/// delta, every later non-null row the change in delta. The planner never
/// selects this tag; it exists for artifacts that carry it.
pub fn write_time_dod(cells: &[Cell<'_>], out: &mut Vec<u8>) {
    let mut prev: i64 = 0;
    let mut prev_delta: i64 = 0;
    let mut seen: usize = 0;
    for cell in cells {
        match cell.and_then(as_int53) {
            Some(v) => {
                let wire = match seen {
                    0 => v,
                    1 => {
                        prev_delta = v - prev;
                        prev_delta
                    }
                    _ => {
                        let delta = v - prev;
                        let dod = delta - prev_delta;
                        prev_delta = delta;
                        dod
                    }
                };
                leb128::encode_one(zigzag::encode_opt(Some(wire)), out);
                prev = v;
                seen += 1;
            }
            None => leb128::encode_one(0u64, out),
        }
    }
}

/// Repeated `value_code:u8 || varint(run_len)` groups. Codes: 0 null,
/// 1 false, 2 true.
fn write_bool_rle(cells: &[Cell<'_>], out: &mut Vec<u8>) {
    let code_of = |cell: &Cell<'_>| -> u8 {
        match cell.and_then(|v| v.as_bool()) {
            None => 0,
            Some(false) => 1,
            Some(true) => 2,
        }
    };

    let mut iter = cells.iter();
    let mut current = match iter.next() {
        Some(cell) => code_of(cell),
        None => return,
    };
    let mut run: u32 = 1;
    for cell in iter {
        let code = code_of(cell);
        if code == current {
            run += 1;
        } else {
            out.push(current);
            leb128::encode_one(run, out);
            current = code;
            run = 1;
        }
    }
    out.push(current);
    leb128::encode_one(run, out);
}

/// `u8 dict_count || (varint(len) || bytes) * dict_count || u8 id * rows`.
/// The dictionary is the sorted set of distinct non-null strings; id 255
/// is the null cell.
fn write_enum_ids(cells: &[Cell<'_>], dict: &[String], out: &mut Vec<u8>) -> Result<(), JcoError> {
    out.push(dict.len() as u8);
    for entry in dict {
        leb128::encode_one(entry.len() as u32, out);
        out.extend_from_slice(entry.as_bytes());
    }
    for cell in cells {
        match cell.and_then(|v| v.as_str()) {
            Some(s) => {
                let id = dict.binary_search_by(|d| d.as_str().cmp(s)).map_err(|_| {
                    JcoError::Internal(format!("enum dictionary is missing value {:?}", s))
                })?;
                out.push(id as u8);
            }
            None => out.push(ENUM_NULL_ID),
        }
    }
    Ok(())
}

/// `(varint(len) || bytes) * rows` where each element is the compact JSON
/// text of the value; null cells write the literal `null`.
fn write_raw_json(cells: &[Cell<'_>], out: &mut Vec<u8>) {
    for cell in cells {
        match cell {
            Some(value) => {
                // Compact printing of a value that came from the parser
                // cannot fail.
                let text = value.to_string();
                leb128::encode_one(text.len() as u32, out);
                out.extend_from_slice(text.as_bytes());
            }
            None => {
                leb128::encode_one(4u32, out);
                out.extend_from_slice(b"null");
            }
        }
    }
}

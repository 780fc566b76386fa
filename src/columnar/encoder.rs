//! The columnar front-end: line splitting, shape grouping, and frame
//! emission.
//!
//! The encoder walks the NDJSON text once, records which lines carry a
//! JSON record in the global line-presence bitmap, groups records by
//! shape, then emits the line-presence frame followed by one shape frame
//! per batch of at most 4096 rows. Unparseable non-blank lines keep
//! their position (a 0 bit) and lose their content; that is a documented
//! contract, not an error.

use serde_json::Value;

use crate::column::encode::encode_column;
use crate::column::plan::Cell;
use crate::error::JcoError;
use crate::frame::writer::{write_line_presence_frame, write_shape_frame};
use crate::frame::{FRAME_SEPARATOR, MAX_ROWS_PER_FRAME};
use crate::kernels::bitmap::Bitmap;
use crate::log_metric;

use super::shape::{ShapeGroup, ShapeTable};

/// Below this many valid records the columnar path declines.
pub const MIN_COLUMNAR_RECORDS: usize = 3;
/// Below this raw input length the columnar path declines.
pub const MIN_COLUMNAR_INPUT_LEN: usize = 64;

/// Splits input into lines: one optional UTF-8 BOM is stripped, lines
/// break on `\n`, and one trailing `\r` per line is dropped. A trailing
/// newline therefore yields a final empty line, which round-trips.
pub fn split_lines(input: &str) -> Vec<&str> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Runs the columnar front-end over NDJSON text. Returns `None` when the
/// fallback policy declines (tiny input or too few valid records) and the
/// caller should take the row-wise path instead.
pub fn encode(input: &str) -> Result<Option<Vec<u8>>, JcoError> {
    if input.len() < MIN_COLUMNAR_INPUT_LEN {
        return Ok(None);
    }

    let lines = split_lines(input);
    let mut line_presence = Bitmap::new(lines.len());
    let mut table = ShapeTable::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(record)) => {
                line_presence.set(i, true);
                table.push(record);
            }
            // Parse failures and non-object values keep their position
            // but contribute no record.
            _ => {}
        }
    }

    if table.record_count() < MIN_COLUMNAR_RECORDS {
        return Ok(None);
    }

    log_metric!(
        "event" = "columnar_encode",
        "lines" = &lines.len(),
        "records" = &table.record_count(),
        "shapes" = &table.groups().len(),
    );

    let mut body = write_line_presence_frame(&line_presence);
    for group in table.groups() {
        for batch_start in (0..group.records.len()).step_by(MAX_ROWS_PER_FRAME) {
            let batch_end = (batch_start + MAX_ROWS_PER_FRAME).min(group.records.len());
            body.push(FRAME_SEPARATOR);
            let frame = encode_batch(group, batch_start..batch_end)?;
            body.extend_from_slice(&frame);
        }
    }
    Ok(Some(body))
}

/// Encodes one batch of a shape group into a shape frame.
fn encode_batch(group: &ShapeGroup, batch: std::ops::Range<usize>) -> Result<Vec<u8>, JcoError> {
    let records = &group.records[batch];
    let rows = records.len();
    let key_count = group.keys.len();

    let mut presence = Bitmap::new(rows * key_count);
    let mut columns = Vec::with_capacity(key_count);
    for (k, key) in group.keys.iter().enumerate() {
        let mut cells: Vec<Cell<'_>> = Vec::with_capacity(rows);
        for (row, record) in records.iter().enumerate() {
            match record.get(key) {
                Some(value) => {
                    presence.set(row * key_count + k, true);
                    cells.push(if value.is_null() { None } else { Some(value) });
                }
                None => cells.push(None),
            }
        }
        columns.push(encode_column(&cells)?);
    }

    write_shape_frame(group.shape_id, &group.keys, rows, &presence, &columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::reader::parse_body;

    #[test]
    fn test_declines_tiny_input() {
        assert!(encode("{\"a\":1}\n{\"a\":2}").unwrap().is_none());
    }

    #[test]
    fn test_declines_too_few_records() {
        // Long enough input, but only two records parse.
        let input = format!(
            "{}\n{}\nnot json at all, just padding padding padding padding padding",
            "{\"a\":1}", "{\"a\":2}"
        );
        assert!(input.len() >= MIN_COLUMNAR_INPUT_LEN);
        assert!(encode(&input).unwrap().is_none());
    }

    #[test]
    fn test_emits_line_presence_then_shape_frames() {
        let input =
            "{\"a\":100,\"b\":200}\n\n{\"a\":300,\"b\":400}\n{\"a\":500,\"b\":600}\n{\"a\":700,\"c\":800}";
        assert!(input.len() >= MIN_COLUMNAR_INPUT_LEN);
        let body = encode(input).unwrap().expect("columnar path should engage");
        let (lp, frames) = parse_body(&body).unwrap();
        assert_eq!(lp.lines.len(), 5);
        assert!(!lp.lines.get(1)); // the blank line
        assert_eq!(frames.len(), 2); // shapes {a,b} and {a,c}
        assert_eq!(frames[0].rows, 3);
        assert_eq!(frames[1].rows, 1);
    }

    #[test]
    fn test_batches_split_at_row_bound() {
        let mut input = String::new();
        for i in 0..(MAX_ROWS_PER_FRAME + 1) {
            input.push_str(&format!("{{\"n\":{}}}\n", i));
        }
        input.pop(); // no trailing newline, keep the count exact
        let body = encode(&input).unwrap().unwrap();
        let (_, frames) = parse_body(&body).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].rows, MAX_ROWS_PER_FRAME);
        assert_eq!(frames[1].rows, 1);
    }

    #[test]
    fn test_unparseable_line_keeps_position_only() {
        let input = "{\"a\":1}\n{broken\n{\"a\":2}\n{\"a\":3}\npadding padding padding padding padding";
        assert!(input.len() >= MIN_COLUMNAR_INPUT_LEN);
        let body = encode(input).unwrap().unwrap();
        let (lp, frames) = parse_body(&body).unwrap();
        assert_eq!(lp.lines.len(), 5);
        assert!(lp.lines.get(0));
        assert!(!lp.lines.get(1));
        assert!(!lp.lines.get(4));
        assert_eq!(frames.iter().map(|f| f.rows).sum::<usize>(), 3);
    }
}
